//! Rigid-body components
//!
//! A rigid component owns its actor handle, the colliders attached to that
//! actor and the scene node the actor drives. Dynamic bodies write their
//! simulated pose back into the node after every step; static bodies are
//! placed once.

use rapier3d::prelude::{RigidBodyBuilder, RigidBodyHandle, RigidBodyType};

use super::collider::Collider;
use crate::core::SimulationContext;
use crate::ecs::{Component, ComponentType, Entity, World};
use crate::foundation::math::Transform;
use crate::physics::{PhysicsBody, PhysicsError, PhysicsWorld};
use crate::scene::{SceneGraph, TransformKey};

/// Rigid actor plus its shapes
#[derive(Debug, Clone)]
pub struct RigidDynamicComponent {
    body_type: RigidBodyType,
    entity: Option<Entity>,
    actor: Option<RigidBodyHandle>,
    colliders: Vec<Collider>,
    transform: Option<TransformKey>,
}

impl Default for RigidDynamicComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidDynamicComponent {
    /// Dynamic body without colliders
    pub fn new() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            entity: None,
            actor: None,
            colliders: Vec::new(),
            transform: None,
        }
    }

    /// Static (fixed) body without colliders
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            ..Self::new()
        }
    }

    /// Builder pattern: add a collider, created together with the actor
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    /// Whether the body is simulated
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }

    /// Colliders in attachment order
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Mutable colliders
    pub fn colliders_mut(&mut self) -> &mut [Collider] {
        &mut self.colliders
    }

    /// Scene node driven by the actor
    pub fn transform_key(&self) -> Option<TransformKey> {
        self.transform
    }

    /// Bind to an entity without going through a [`World`]
    pub fn bind(&mut self, entity: Option<Entity>, transform: TransformKey) {
        self.entity = entity;
        self.transform = Some(transform);
    }

    /// Build the actor at the global pose of `transform` and attach every collider
    pub fn create_actor(
        &mut self,
        physics: &mut PhysicsWorld,
        scene: &SceneGraph,
        transform: TransformKey,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        let builder = RigidBodyBuilder::new(self.body_type);
        self.create_actor_with(physics, scene, transform, builder)
    }

    /// Like [`Self::create_actor`] with a caller-configured body builder.
    ///
    /// On failure nothing created here is left in the world.
    pub fn create_actor_with(
        &mut self,
        physics: &mut PhysicsWorld,
        scene: &SceneGraph,
        transform: TransformKey,
        builder: RigidBodyBuilder,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        self.release(physics);

        let pose = scene.global(transform).unwrap_or_default().to_isometry();
        let actor = physics.insert_body(builder.position(pose).build());
        for collider in &mut self.colliders {
            if let Err(err) = collider.create_shape(actor, physics) {
                log::warn!("Rigid body creation failed: {}", err);
                physics.remove_body(actor);
                self.colliders.iter_mut().for_each(Collider::forget_shape);
                return Err(err);
            }
        }

        self.actor = Some(actor);
        self.transform = Some(transform);
        Ok(actor)
    }

    /// Attach one more collider to a live actor
    pub fn add_collider(&mut self, mut collider: Collider, physics: &mut PhysicsWorld) -> Result<(), PhysicsError> {
        if let Some(actor) = self.actor {
            collider.create_shape(actor, physics)?;
        }
        self.colliders.push(collider);
        Ok(())
    }

    /// Remove the actor and its shapes from the world
    pub fn release(&mut self, physics: &mut PhysicsWorld) {
        if let Some(actor) = self.actor.take() {
            physics.remove_body(actor);
        }
        self.colliders.iter_mut().for_each(Collider::forget_shape);
    }

    /// Copy the actor pose into the scene node, keeping the node's scale
    pub fn sync_transform(&self, physics: &PhysicsWorld, scene: &mut SceneGraph) -> Option<Transform> {
        let pose = physics.body_pose(self.actor?)?;
        let key = self.transform?;
        let mut global = scene.global(key)?;
        global.set_isometry(&pose);
        scene.set_global(key, global);
        Some(global)
    }
}

impl PhysicsBody for RigidDynamicComponent {
    fn body_handle(&self) -> Option<RigidBodyHandle> {
        self.actor
    }

    fn entity(&self) -> Option<Entity> {
        self.entity
    }

    fn update_from_physics(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        if self.is_dynamic() {
            self.sync_transform(physics, scene);
        }
    }
}

impl Component for RigidDynamicComponent {
    fn component_type(&self) -> ComponentType {
        if self.is_dynamic() {
            ComponentType::RigidDynamic
        } else {
            ComponentType::RigidStatic
        }
    }

    fn set_entity(&mut self, entity: Entity, world: &mut World, _ctx: &SimulationContext) {
        self.entity = Some(entity);
        self.transform = world.transform_key(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::{ColliderGeometry, QueryFilterData};
    use approx::assert_relative_eq;

    fn ball(physics: &PhysicsWorld, radius: f32) -> Collider {
        Collider::new(
            "Default",
            physics.materials().get("Default"),
            QueryFilterData::default(),
            ColliderGeometry::Sphere { radius },
        )
    }

    #[test]
    fn test_falling_body_moves_transform() {
        let mut physics = PhysicsWorld::default();
        let mut world = World::new();
        let entity = world.create_entity(Transform::from_position(Vec3::new(0.0, 10.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)));
        let mut body = RigidDynamicComponent::new().with_collider(ball(&physics, 0.5));
        body.set_entity(entity, &mut world, &SimulationContext::default());
        let key = body.transform_key().unwrap();
        body.create_actor(&mut physics, &world.scene, key).unwrap();

        for _ in 0..30 {
            physics.step(1.0 / 60.0);
        }
        body.update_from_physics(&mut physics, &mut world.scene);

        let transform = world.transform(entity).unwrap();
        assert!(transform.position.y < 10.0);
        assert_relative_eq!(transform.scale, Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(
            transform.position,
            physics.body_pose(body.body_handle().unwrap()).unwrap().translation.vector
        );
    }

    #[test]
    fn test_static_body_ignores_physics_updates() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let key = scene.insert(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let mut body = RigidDynamicComponent::new_static().with_collider(ball(&physics, 1.0));
        body.create_actor(&mut physics, &scene, key).unwrap();

        physics.step(1.0 / 60.0);
        scene.set_local(key, Transform::identity());
        body.update_from_physics(&mut physics, &mut scene);

        assert_eq!(body.component_type(), ComponentType::RigidStatic);
        assert_eq!(scene.global(key).unwrap().position, Vec3::zeros());
    }

    #[test]
    fn test_failed_creation_leaves_nothing_behind() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let key = scene.insert(Transform::identity());
        let mut body = RigidDynamicComponent::new()
            .with_collider(ball(&physics, 0.5))
            .with_collider(ball(&physics, 0.0));

        let result = body.create_actor(&mut physics, &scene, key);

        assert!(matches!(result, Err(PhysicsError::InvalidGeometry(_))));
        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.collider_count(), 0);
        assert!(body.body_handle().is_none());
        assert!(body.colliders().iter().all(|c| c.shape().is_none()));
    }
}
