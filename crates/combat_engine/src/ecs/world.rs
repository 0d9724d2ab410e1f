//! Entity registry and the scene graph entity transforms live in

use std::collections::HashMap;

use super::Entity;
use crate::foundation::math::Transform;
use crate::scene::{SceneGraph, TransformKey};

/// Entities and their root transforms
pub struct World {
    next_entity_id: u32,
    entities: HashMap<Entity, TransformKey>,
    /// Transform hierarchy shared by entities and their components
    pub scene: SceneGraph,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            next_entity_id: 0,
            entities: HashMap::new(),
            scene: SceneGraph::new(),
        }
    }

    /// Create a new entity with a root transform
    pub fn create_entity(&mut self, transform: Transform) -> Entity {
        self.spawn(transform).0
    }

    /// Like [`Self::create_entity`], also returning the root transform node
    pub fn spawn(&mut self, transform: Transform) -> (Entity, TransformKey) {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        let key = self.scene.insert(transform);
        self.entities.insert(entity, key);
        (entity, key)
    }

    /// Remove an entity and its root transform; children are detached
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        match self.entities.remove(&entity) {
            Some(key) => {
                self.scene.remove(key);
                true
            }
            None => false,
        }
    }

    /// Whether the entity is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Root transform node of an entity
    pub fn transform_key(&self, entity: Entity) -> Option<TransformKey> {
        self.entities.get(&entity).copied()
    }

    /// Global transform of an entity
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.transform_key(entity).and_then(|key| self.scene.global(key))
    }

    /// Get an iterator over all entities
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.keys()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entities exist
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_entities_own_a_transform_node() {
        let mut world = World::new();
        let a = world.create_entity(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        let b = world.create_entity(Transform::identity());

        assert_ne!(a, b);
        assert_eq!(world.transform(a).map(|t| t.position), Some(Vec3::new(1.0, 2.0, 3.0)));

        assert!(world.destroy_entity(a));
        assert!(!world.contains(a));
        assert!(world.transform(a).is_none());
        assert_eq!(world.scene.len(), 1);
    }
}
