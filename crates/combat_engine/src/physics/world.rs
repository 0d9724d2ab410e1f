//! Physics world
//!
//! Owns every rapier set and pipeline plus the shared collision-group table
//! and material library. Components hold handles into this world and go
//! through it to create, edit and release their bodies and shapes.

use rapier3d::control::DynamicRayCastVehicleController;
use rapier3d::crossbeam::channel::{unbounded, Receiver};
use rapier3d::prelude::{
    BroadPhase, CCDSolver, ChannelEventCollector, Collider, ColliderHandle, ColliderSet, CollisionEvent,
    ContactForceEvent, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, QueryFilter, QueryPipeline, Ray, RigidBody, RigidBodyHandle, RigidBodySet,
};

use super::{CollisionGroupTable, MaterialLibrary, PhysicsError, QueryFilterData};
use crate::core::config::SimulationConfig;
use crate::foundation::math::{Isometry, Point3, Vec3};

/// A contact or trigger overlap that started during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// First collider involved
    pub collider1: ColliderHandle,
    /// Second collider involved
    pub collider2: ColliderHandle,
    /// At least one of the shapes is a trigger
    pub sensor: bool,
}

/// Rigid-body simulation and scene queries
pub struct PhysicsWorld {
    gravity: Vec3,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collision_groups: CollisionGroupTable,
    materials: MaterialLibrary,
    event_collector: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    contact_force_events: Receiver<ContactForceEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl PhysicsWorld {
    /// Create an empty world from the simulation settings
    pub fn new(config: &SimulationConfig) -> Self {
        let (collision_tx, collision_events) = unbounded();
        let (contact_force_tx, contact_force_events) = unbounded();

        let integration_parameters = IntegrationParameters {
            dt: config.physics.fixed_timestep,
            ..IntegrationParameters::default()
        };

        log::info!(
            "Physics world created: gravity {:?}, step {:.4}s, {} collision groups",
            config.physics.gravity,
            config.physics.fixed_timestep,
            config.collision_groups.len()
        );

        Self {
            gravity: Vec3::from(config.physics.gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collision_groups: CollisionGroupTable::from_config(&config.collision_groups),
            materials: MaterialLibrary::from_config(&config.materials),
            event_collector: ChannelEventCollector::new(collision_tx, contact_force_tx),
            collision_events,
            contact_force_events,
        }
    }

    /// World gravity
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Named collision groups
    pub fn collision_groups(&self) -> &CollisionGroupTable {
        &self.collision_groups
    }

    /// Shared materials
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Shared materials, for registering new ones
    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    /// Add a rigid body
    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    /// Get a rigid body
    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Get a mutable rigid body
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// World pose of a rigid body
    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<Isometry> {
        self.bodies.get(handle).map(|body| *body.position())
    }

    /// Remove a rigid body together with every shape attached to it
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )
    }

    /// Number of live rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Attach a shape to a body and refresh the body's mass properties
    pub fn attach_collider(&mut self, collider: Collider, parent: RigidBodyHandle) -> Result<ColliderHandle, PhysicsError> {
        if !self.bodies.contains(parent) {
            return Err(PhysicsError::MissingBody(parent));
        }
        let handle = self.colliders.insert_with_parent(collider, parent, &mut self.bodies);
        // mass properties are otherwise only refreshed inside the next step
        if let Some(body) = self.bodies.get_mut(parent) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        Ok(handle)
    }

    /// Detach and destroy a shape; returns false if it was already gone
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let parent = self.colliders.get(handle).and_then(|collider| collider.parent());
        let removed = self
            .colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true)
            .is_some();
        if let Some(body) = parent.and_then(|parent| self.bodies.get_mut(parent)) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        removed
    }

    /// Get a shape
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Get a mutable shape
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    /// Number of live shapes
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Rebuild the scene-query structure from current shape poses
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.bodies, &self.colliders);
    }

    /// Run a vehicle solver against this world.
    ///
    /// Suspension rays ignore the chassis itself and every shape whose
    /// query filter data is not a drivable surface outside `raycast_group`.
    pub fn update_vehicle_controller(
        &mut self,
        controller: &mut DynamicRayCastVehicleController,
        dt: f32,
        raycast_group: u32,
    ) {
        if !self.bodies.contains(controller.chassis) {
            log::trace!("Vehicle update skipped, chassis {:?} is gone", controller.chassis);
            return;
        }
        let predicate = suspension_predicate(raycast_group);
        let filter = QueryFilter::new()
            .exclude_rigid_body(controller.chassis)
            .predicate(&predicate);
        controller.update_vehicle(dt, &mut self.bodies, &self.colliders, &self.query_pipeline, filter);
    }

    /// Cast a ray that only hits what a suspension ray of `raycast_group` would hit
    pub fn cast_suspension_ray(
        &self,
        origin: Point3,
        direction: Vec3,
        max_distance: f32,
        raycast_group: u32,
    ) -> Option<(ColliderHandle, f32)> {
        let predicate = suspension_predicate(raycast_group);
        let filter = QueryFilter::new().predicate(&predicate);
        let ray = Ray::new(origin, direction);
        self.query_pipeline
            .cast_ray(&self.bodies, &self.colliders, &ray, max_distance, true, filter)
    }

    /// Advance the simulation by `dt` seconds and report the contacts and
    /// trigger overlaps that started during the step
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        if !(dt > 0.0) {
            log::trace!("Ignoring physics step of {}s", dt);
            return Vec::new();
        }
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        while self.contact_force_events.try_recv().is_ok() {}

        self.collision_events
            .try_iter()
            .filter(|event| event.started())
            .map(|event| ContactEvent {
                collider1: event.collider1(),
                collider2: event.collider2(),
                sensor: event.sensor(),
            })
            .collect()
    }
}

fn suspension_predicate(raycast_group: u32) -> impl Fn(ColliderHandle, &Collider) -> bool {
    move |_, collider| QueryFilterData::from_user_data(collider.user_data).accepts_suspension_ray(raycast_group)
}
