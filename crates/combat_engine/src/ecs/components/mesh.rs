//! Mesh instances placed in the scene
//!
//! Mesh data itself stays with the renderer; the simulation only tracks
//! which shared prefab an instance shows and where it sits.

use std::sync::Arc;

use crate::core::SimulationContext;
use crate::ecs::{Component, ComponentType, Entity, World};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::scene::{SceneGraph, TransformKey};

/// Shared, immutable mesh description
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAsset {
    /// Asset name the renderer resolves
    pub name: String,
    /// Material the renderer binds
    pub material: String,
    /// Half extents of the bounding box in mesh space
    pub half_extents: Vec3,
}

impl MeshAsset {
    /// Create a shared mesh description
    pub fn new(name: impl Into<String>, material: impl Into<String>, half_extents: Vec3) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            material: material.into(),
            half_extents,
        })
    }
}

/// One placed copy of a [`MeshAsset`]
#[derive(Debug, Clone)]
pub struct MeshComponent {
    prefab: Arc<MeshAsset>,
    local: Transform,
    transform: Option<TransformKey>,
    /// Whether the renderer should draw this instance
    pub visible: bool,
}

impl MeshComponent {
    /// Create an instance of `prefab` at the identity
    pub fn new(prefab: Arc<MeshAsset>) -> Self {
        Self {
            prefab,
            local: Transform::identity(),
            transform: None,
            visible: true,
        }
    }

    /// Builder pattern: set the local transform used when attached
    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// The shared prefab
    pub fn prefab(&self) -> &Arc<MeshAsset> {
        &self.prefab
    }

    /// Scene node, once attached
    pub fn transform_key(&self) -> Option<TransformKey> {
        self.transform
    }

    /// Place the instance under `parent` (or at the root)
    pub fn attach(&mut self, scene: &mut SceneGraph, parent: Option<TransformKey>) -> TransformKey {
        if let Some(old) = self.transform.take() {
            scene.remove(old);
        }
        let key = match parent {
            Some(parent) => scene.insert_child(parent, self.local),
            None => scene.insert(self.local),
        };
        self.transform = Some(key);
        key
    }

    /// Remove the instance from the scene
    pub fn detach(&mut self, scene: &mut SceneGraph) {
        if let Some(key) = self.transform.take() {
            scene.remove(key);
        }
    }

    /// Local transform relative to the parent
    pub fn local_transform(&self) -> Transform {
        self.local
    }

    /// Overwrite the local transform
    pub fn set_local_transform(&mut self, scene: &mut SceneGraph, local: Transform) {
        self.local = local;
        if let Some(key) = self.transform {
            scene.set_local(key, local);
        }
    }

    /// World matrix handed to the renderer
    pub fn world_matrix(&self, scene: &SceneGraph) -> Mat4 {
        match self.transform {
            Some(key) => scene.global_matrix(key),
            None => self.local.to_matrix(),
        }
    }
}

impl Component for MeshComponent {
    fn component_type(&self) -> ComponentType {
        ComponentType::Mesh
    }

    fn set_entity(&mut self, entity: Entity, world: &mut World, _ctx: &SimulationContext) {
        let parent = world.transform_key(entity);
        self.attach(&mut world.scene, parent);
    }
}
