//! Collider component
//!
//! Binds a geometry descriptor, a shared material and the two independent
//! filter setups (scene queries vs. contact generation) to a rigid actor.
//! The rapier shape only exists between [`Collider::create_shape`] and
//! [`Collider::release`].

use std::sync::Arc;

use rapier3d::prelude::{ActiveEvents, ColliderHandle, RigidBodyHandle};

use crate::config::ConfigDocument;
use crate::debug::DebugUi;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::{
    ColliderGeometry, PhysicsError, PhysicsMaterial, PhysicsWorld, QueryFilterData, QueryFilterType,
    SimulationFilterData, DEFAULT_GROUP,
};

/// Collision shape attached to an actor
#[derive(Debug, Clone)]
pub struct Collider {
    collision_group: String,
    material: Arc<PhysicsMaterial>,
    query_filter: QueryFilterData,
    simulation_filter: Option<SimulationFilterData>,
    transform: Transform,
    geometry: ColliderGeometry,
    density: f32,
    shape: Option<ColliderHandle>,
}

impl Collider {
    /// Create a collider from explicit parameters
    pub fn new(
        collision_group: impl Into<String>,
        material: Arc<PhysicsMaterial>,
        query_filter: QueryFilterData,
        geometry: ColliderGeometry,
    ) -> Self {
        Self {
            collision_group: collision_group.into(),
            material,
            query_filter,
            simulation_filter: None,
            transform: Transform::identity(),
            geometry,
            density: 1.0,
            shape: None,
        }
    }

    /// Read a collider document. Missing keys use defaults.
    pub fn from_config(doc: &ConfigDocument, physics: &PhysicsWorld) -> Self {
        let collision_group = doc.str_or("CollisionGroup", DEFAULT_GROUP);
        let material = physics.materials().get(&doc.str_or("Material", "Default"));
        let query_filter = QueryFilterType::from_config_name(&doc.str_or("QueryFilterType", "DrivableSurface"))
            .filter_data();

        let transform = Transform::from_euler_degrees(
            doc.vec3_or("Position", Vec3::zeros()),
            doc.vec3_or("Rotation", Vec3::zeros()),
            doc.vec3_or("Scale", Vec3::new(1.0, 1.0, 1.0)),
        );
        // scale lives in the shape, the pose stays rigid
        let geometry = ColliderGeometry::from_config(doc).scaled(transform.scale);

        Self {
            transform: transform.with_scale(Vec3::new(1.0, 1.0, 1.0)),
            density: doc.get_or("Density", 1.0),
            ..Self::new(collision_group, material, query_filter, geometry)
        }
    }

    /// Builder pattern: set the pose relative to the actor
    pub fn with_local_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: set the density used for the actor's mass
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Attach the shape to `actor`, replacing any shape this collider already owns
    pub fn create_shape(&mut self, actor: RigidBodyHandle, physics: &mut PhysicsWorld) -> Result<ColliderHandle, PhysicsError> {
        self.release(physics);

        let simulation_filter = physics.collision_groups().filter(&self.collision_group);
        let groups = simulation_filter.interaction_groups();
        let collider = self
            .geometry
            .to_builder()?
            .position(self.transform.to_isometry())
            .friction(self.material.friction())
            .restitution(self.material.restitution)
            .density(self.density)
            .collision_groups(groups)
            .solver_groups(groups)
            .sensor(simulation_filter.trigger)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(self.query_filter.to_user_data())
            .build();

        let handle = physics.attach_collider(collider, actor)?;
        self.shape = Some(handle);
        self.simulation_filter = Some(simulation_filter);
        Ok(handle)
    }

    /// Destroy the shape; calling again is a no-op
    pub fn release(&mut self, physics: &mut PhysicsWorld) {
        if let Some(handle) = self.shape.take() {
            physics.remove_collider(handle);
        }
    }

    /// Forget the shape without touching the world, for when its actor was removed with it
    pub(crate) fn forget_shape(&mut self) {
        self.shape = None;
    }

    /// Live shape handle
    pub fn shape(&self) -> Option<ColliderHandle> {
        self.shape
    }

    /// Collision-group name
    pub fn collision_group(&self) -> &str {
        &self.collision_group
    }

    /// Shared material
    pub fn material(&self) -> &Arc<PhysicsMaterial> {
        &self.material
    }

    /// Geometry in collider space
    pub fn geometry(&self) -> &ColliderGeometry {
        &self.geometry
    }

    /// Scene-query filter data
    pub fn query_filter(&self) -> QueryFilterData {
        self.query_filter
    }

    /// Simulation filter data, resolved when the shape was created
    pub fn simulation_filter(&self) -> Option<SimulationFilterData> {
        self.simulation_filter
    }

    /// Change the query filter; pushed to a live shape immediately
    pub fn set_query_filter(&mut self, query_filter: QueryFilterData, physics: &mut PhysicsWorld) {
        self.query_filter = query_filter;
        if let Some(shape) = self.shape.and_then(|handle| physics.collider_mut(handle)) {
            shape.user_data = query_filter.to_user_data();
        }
    }

    /// Pose relative to the actor
    pub fn local_transform(&self) -> Transform {
        self.transform
    }

    /// Pose in world space; the local pose until the shape exists
    pub fn global_transform(&self, physics: &PhysicsWorld) -> Transform {
        let actor_pose = self
            .shape
            .and_then(|handle| physics.collider(handle))
            .and_then(|shape| shape.parent())
            .and_then(|actor| physics.body_pose(actor));

        match actor_pose {
            Some(actor_pose) => Transform::from_isometry(&(actor_pose * self.transform.to_isometry())),
            None => self.transform,
        }
    }

    /// Move the shape relative to its actor
    pub fn set_local_transform(&mut self, transform: Transform, physics: &mut PhysicsWorld) {
        self.transform = transform;
        let Some(handle) = self.shape else { return };
        match physics.collider_mut(handle) {
            Some(shape) => shape.set_position_wrt_parent(transform.to_isometry()),
            None => log::trace!("Collider {:?} is gone, local pose kept for the next shape", handle),
        }
    }

    /// Inspect group and material; transform edits re-apply to the shape
    pub fn render_debug_gui(&mut self, ui: &mut dyn DebugUi, physics: &mut PhysicsWorld) {
        if ui.tree_node("Transform") {
            let mut transform = self.transform;
            if transform.render_debug_gui(ui) {
                self.set_local_transform(transform, physics);
            }
            ui.tree_pop();
        }
        ui.label("Type", self.geometry.collider_type().type_name());
        ui.label("Collision Group", &self.collision_group);
        ui.text(&format!("Static Friction: {:.3}", self.material.static_friction));
        ui.text(&format!("Dynamic Friction: {:.3}", self.material.dynamic_friction));
        ui.text(&format!("Restitution: {:.3}", self.material.restitution));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{RecordingUi, ScriptedEdit};
    use approx::assert_relative_eq;
    use rapier3d::prelude::RigidBodyBuilder;

    fn dynamic_actor(physics: &mut PhysicsWorld, position: Vec3) -> RigidBodyHandle {
        physics.insert_body(RigidBodyBuilder::dynamic().translation(position).build())
    }

    #[test]
    fn test_from_config_defaults() {
        let physics = PhysicsWorld::default();
        let collider = Collider::from_config(&ConfigDocument::new(), &physics);

        assert_eq!(collider.collision_group(), "Default");
        assert_eq!(collider.material().name, "Default");
        assert!(collider.query_filter().is_drivable());
        assert_eq!(collider.geometry().collider_type().type_name(), "Box");
        assert!(collider.shape().is_none());
    }

    #[test]
    fn test_config_scale_is_baked_into_geometry() {
        let physics = PhysicsWorld::default();
        let doc = ConfigDocument::new()
            .with("Type", "Box")
            .with_vec3("Size", Vec3::new(1.0, 1.0, 1.0))
            .with_vec3("Scale", Vec3::new(2.0, 4.0, 6.0))
            .with("QueryFilterType", "NonDrivableSurface")
            .with("Material", "Metal.json");

        let collider = Collider::from_config(&doc, &physics);

        assert_eq!(collider.geometry(), &ColliderGeometry::Box { half_extents: Vec3::new(1.0, 2.0, 3.0) });
        assert_eq!(collider.local_transform().scale, Vec3::new(1.0, 1.0, 1.0));
        assert!(!collider.query_filter().is_drivable());
        assert_eq!(collider.material().name, "Metal");
    }

    #[test]
    fn test_create_shape_applies_filters() {
        let mut physics = PhysicsWorld::default();
        let actor = dynamic_actor(&mut physics, Vec3::zeros());
        let query_filter = QueryFilterType::NonDrivableSurface.filter_data().with_raycast_group(1 << 3);
        let mut collider = Collider::new(
            "Vehicles",
            physics.materials().get("Metal"),
            query_filter,
            ColliderGeometry::cuboid(Vec3::new(2.0, 1.0, 4.0)),
        );

        let handle = collider.create_shape(actor, &mut physics).unwrap();
        let shape = physics.collider(handle).unwrap();

        assert_eq!(QueryFilterData::from_user_data(shape.user_data), query_filter);
        assert_eq!(shape.collision_groups(), physics.collision_groups().filter("Vehicles").interaction_groups());
        assert!(!shape.is_sensor());
        assert_relative_eq!(shape.friction(), 0.3);
    }

    #[test]
    fn test_trigger_group_creates_sensor() {
        let mut physics = PhysicsWorld::default();
        let actor = dynamic_actor(&mut physics, Vec3::zeros());
        let mut collider = Collider::new(
            "PowerUps",
            physics.materials().get("Default"),
            QueryFilterData::default(),
            ColliderGeometry::Sphere { radius: 1.0 },
        );

        let handle = collider.create_shape(actor, &mut physics).unwrap();

        assert!(physics.collider(handle).unwrap().is_sensor());
    }

    #[test]
    fn test_second_create_replaces_shape() {
        let mut physics = PhysicsWorld::default();
        let actor = dynamic_actor(&mut physics, Vec3::zeros());
        let mut collider = Collider::new(
            "Default",
            physics.materials().get("Default"),
            QueryFilterData::default(),
            ColliderGeometry::Sphere { radius: 0.5 },
        );

        let first = collider.create_shape(actor, &mut physics).unwrap();
        let second = collider.create_shape(actor, &mut physics).unwrap();

        assert_ne!(first, second);
        assert!(physics.collider(first).is_none());
        assert_eq!(physics.collider_count(), 1);

        collider.release(&mut physics);
        collider.release(&mut physics);
        assert_eq!(physics.collider_count(), 0);
    }

    #[test]
    fn test_global_transform_composes_actor_pose() {
        let mut physics = PhysicsWorld::default();
        let actor = dynamic_actor(&mut physics, Vec3::new(0.0, 5.0, 0.0));
        let mut collider = Collider::new(
            "Default",
            physics.materials().get("Default"),
            QueryFilterData::default(),
            ColliderGeometry::Sphere { radius: 0.5 },
        )
        .with_local_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));

        assert_eq!(collider.global_transform(&physics).position, Vec3::new(1.0, 0.0, 0.0));

        collider.create_shape(actor, &mut physics).unwrap();
        assert_relative_eq!(collider.global_transform(&physics).position, Vec3::new(1.0, 5.0, 0.0));

        collider.set_local_transform(Transform::from_position(Vec3::new(0.0, -1.0, 0.0)), &mut physics);
        let handle = collider.shape().unwrap();
        let pose = physics.collider(handle).unwrap().position_wrt_parent().copied().unwrap();
        assert_relative_eq!(pose.translation.vector, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_debug_gui_edit_reapplies_pose() {
        let mut physics = PhysicsWorld::default();
        let actor = dynamic_actor(&mut physics, Vec3::zeros());
        let mut collider = Collider::new(
            "Ground",
            physics.materials().get("Asphalt"),
            QueryFilterData::default(),
            ColliderGeometry::Sphere { radius: 0.5 },
        );
        let handle = collider.create_shape(actor, &mut physics).unwrap();
        let mut ui = RecordingUi::new().with_edit("Position", ScriptedEdit::Vec3(Vec3::new(0.0, 2.0, 0.0)));

        collider.render_debug_gui(&mut ui, &mut physics);

        assert!(ui.contains("Collision Group: Ground"));
        assert!(ui.contains("Dynamic Friction: 0.900"));
        let pose = physics.collider(handle).unwrap().position_wrt_parent().copied().unwrap();
        assert_relative_eq!(pose.translation.vector.y, 2.0);
    }
}
