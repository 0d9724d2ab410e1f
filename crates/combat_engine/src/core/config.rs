//! # Simulation Configuration
//!
//! Typed engine settings loaded through the [`Config`] trait from `.toml` or
//! `.ron` files. Every field has a serde default, so partial files are valid.
//!
//! ## Configuration Categories
//!
//! - **Physics**: gravity and fixed stepping
//! - **Render target**: the output surface the particle and mesh data is prepared for
//! - **Collision groups**: the named filter table colliders reference by name
//! - **Materials**: named friction/restitution sets shared between colliders

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// # Physics Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World gravity in m/s²
    pub gravity: [f32; 3],
    /// Fixed simulation step in seconds
    pub fixed_timestep: f32,
    /// Upper bound on steps run for a single long frame
    pub max_steps_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 5,
        }
    }
}

/// # Render Target Configuration
///
/// Carried in the simulation context in place of a graphics singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTargetConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Shadow map resolution
    pub shadow_map_size: u32,
}

impl Default for RenderTargetConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            shadow_map_size: 2048,
        }
    }
}

impl RenderTargetConfig {
    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// One named entry of the collision-group table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionGroupConfig {
    /// Group name colliders refer to
    pub name: String,
    /// Names of the groups this one generates contacts with (symmetric)
    #[serde(default)]
    pub collides_with: Vec<String>,
    /// Shapes in this group are triggers (overlap only, no response)
    #[serde(default)]
    pub trigger: bool,
}

impl CollisionGroupConfig {
    /// Create a group entry
    pub fn new(name: impl Into<String>, collides_with: &[&str]) -> Self {
        Self {
            name: name.into(),
            collides_with: collides_with.iter().map(|s| (*s).to_string()).collect(),
            trigger: false,
        }
    }

    /// Builder pattern: mark as trigger group
    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }
}

/// Named surface material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Material name colliders refer to
    pub name: String,
    /// Static friction coefficient
    #[serde(default = "default_friction")]
    pub static_friction: f32,
    /// Dynamic friction coefficient
    #[serde(default = "default_friction")]
    pub dynamic_friction: f32,
    /// Restitution coefficient
    #[serde(default)]
    pub restitution: f32,
}

fn default_friction() -> f32 {
    0.5
}

/// The built-in collision table used when no file overrides it
pub fn default_collision_groups() -> Vec<CollisionGroupConfig> {
    vec![
        CollisionGroupConfig::new(
            "Default",
            &["Default", "Ground", "Obstacles", "Vehicles", "Wheels", "Projectiles"],
        ),
        CollisionGroupConfig::new("Ground", &["Default", "Obstacles", "Vehicles", "Projectiles"]),
        CollisionGroupConfig::new("Obstacles", &["Default", "Ground", "Vehicles", "Wheels", "Projectiles"]),
        CollisionGroupConfig::new("Vehicles", &["Default", "Ground", "Obstacles", "Vehicles", "Wheels", "Projectiles"]),
        // wheels ride on ray casts, never on contacts with the ground
        CollisionGroupConfig::new("Wheels", &["Default", "Obstacles", "Vehicles", "Wheels"]),
        CollisionGroupConfig::new("PowerUps", &["Vehicles"]).as_trigger(),
        CollisionGroupConfig::new("Projectiles", &["Default", "Ground", "Obstacles", "Vehicles"]),
    ]
}

/// The built-in material set
pub fn default_materials() -> Vec<MaterialConfig> {
    vec![
        MaterialConfig {
            name: "Default".to_string(),
            static_friction: 0.5,
            dynamic_friction: 0.5,
            restitution: 0.1,
        },
        MaterialConfig {
            name: "Asphalt".to_string(),
            static_friction: 1.0,
            dynamic_friction: 0.9,
            restitution: 0.0,
        },
        MaterialConfig {
            name: "Metal".to_string(),
            static_friction: 0.4,
            dynamic_friction: 0.3,
            restitution: 0.3,
        },
    ]
}

/// # Simulation Configuration
///
/// Top-level settings for a [`crate::simulation::Simulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether debug inspection is enabled
    pub debug_mode: bool,
    /// Physics settings
    pub physics: PhysicsConfig,
    /// Output surface settings
    pub render_target: RenderTargetConfig,
    /// Named collision groups
    pub collision_groups: Vec<CollisionGroupConfig>,
    /// Named materials
    pub materials: Vec<MaterialConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            physics: PhysicsConfig::default(),
            render_target: RenderTargetConfig::default(),
            collision_groups: default_collision_groups(),
            materials: default_materials(),
        }
    }
}

impl SimulationConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Set gravity
    pub fn with_gravity(mut self, gravity: [f32; 3]) -> Self {
        self.physics.gravity = gravity;
        self
    }

    /// Set the fixed simulation step
    pub fn with_fixed_timestep(mut self, step: f32) -> Self {
        self.physics.fixed_timestep = step;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.physics.fixed_timestep > 0.0) {
            return Err("Fixed timestep must be positive".to_string());
        }

        if self.collision_groups.len() > 32 {
            return Err(format!(
                "At most 32 collision groups are supported, got {}",
                self.collision_groups.len()
            ));
        }

        if !self.collision_groups.iter().any(|g| g.name == "Default") {
            return Err("Collision table must define a 'Default' group".to_string());
        }

        Ok(())
    }
}

impl Config for SimulationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            log_level = "debug"
            [physics]
            fixed_timestep = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.physics.fixed_timestep, 0.01);
        assert_eq!(config.physics.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(config.collision_groups, default_collision_groups());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let config = SimulationConfig::default().with_gravity([0.0, -20.0, 0.0]).with_debug(false);

        for name in ["combat_engine_config_test.toml", "combat_engine_config_test.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).unwrap();
            let loaded = SimulationConfig::load_from_file(&path).unwrap();
            let _ = std::fs::remove_file(&path);

            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = SimulationConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_requires_default_group() {
        let mut config = SimulationConfig::default();
        config.collision_groups.retain(|g| g.name != "Default");

        assert!(config.validate().is_err());
    }
}
