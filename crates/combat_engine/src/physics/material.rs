//! Shared physics materials
//!
//! Materials are loaded once and handed out as `Arc`s; any number of
//! colliders may reference the same material.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::{default_materials, MaterialConfig};

/// Friction and restitution of a surface
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsMaterial {
    /// Material name
    pub name: String,
    /// Static friction coefficient
    pub static_friction: f32,
    /// Dynamic friction coefficient
    pub dynamic_friction: f32,
    /// Restitution coefficient
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            static_friction: 0.5,
            dynamic_friction: 0.5,
            restitution: 0.1,
        }
    }
}

impl From<&MaterialConfig> for PhysicsMaterial {
    fn from(config: &MaterialConfig) -> Self {
        Self {
            name: config.name.clone(),
            static_friction: config.static_friction,
            dynamic_friction: config.dynamic_friction,
            restitution: config.restitution,
        }
    }
}

impl PhysicsMaterial {
    /// Single friction coefficient handed to the solver.
    ///
    /// Rapier has one Coulomb coefficient; the dynamic value governs sliding contact.
    pub fn friction(&self) -> f32 {
        self.dynamic_friction
    }
}

/// Named material registry
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: HashMap<String, Arc<PhysicsMaterial>>,
    fallback: Arc<PhysicsMaterial>,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::from_config(&default_materials())
    }
}

impl MaterialLibrary {
    /// Build from configuration entries
    pub fn from_config(materials: &[MaterialConfig]) -> Self {
        let materials: HashMap<String, Arc<PhysicsMaterial>> = materials
            .iter()
            .map(|config| (config.name.clone(), Arc::new(PhysicsMaterial::from(config))))
            .collect();
        let fallback = materials
            .get("Default")
            .cloned()
            .unwrap_or_else(|| Arc::new(PhysicsMaterial::default()));

        Self { materials, fallback }
    }

    /// Look up a material by name, ignoring a `.json` suffix; unknown names get the default
    pub fn get(&self, name: &str) -> Arc<PhysicsMaterial> {
        let key = name.strip_suffix(".json").unwrap_or(name);
        match self.materials.get(key) {
            Some(material) => Arc::clone(material),
            None => {
                log::debug!("Unknown material '{}', using '{}'", name, self.fallback.name);
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Register or replace a material
    pub fn insert(&mut self, material: PhysicsMaterial) -> Arc<PhysicsMaterial> {
        let material = Arc::new(material);
        self.materials.insert(material.name.clone(), Arc::clone(&material));
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_are_shared() {
        let library = MaterialLibrary::default();
        let a = library.get("Asphalt");
        let b = library.get("Asphalt.json");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.friction(), 0.9);
    }

    #[test]
    fn test_unknown_material_uses_default() {
        let library = MaterialLibrary::default();

        assert_eq!(library.get("Ice").name, "Default");
    }
}
