//! # Simulation
//!
//! Owns the entity world (and its scene graph), the physics world and the
//! registry of simulated bodies, and advances them one fixed step at a time.
//!
//! ## Step
//!
//! 1. vehicles turn buffered input into solver controls and run the solver
//! 2. the physics pipeline steps
//! 3. contacts and trigger overlaps that started are dispatched to both bodies
//! 4. every body pulls its new pose (vehicles also re-derive their wheels)
//! 5. particles age and spawn, collected pickups are removed
//!
//! Gameplay events raised during a step are routed to the bodies'
//! [`Component::handle_event`] and queued for [`Simulation::drain_events`].

use std::collections::HashMap;

use rapier3d::prelude::ColliderHandle;
use slotmap::{new_key_type, SlotMap};

use crate::core::{SimulationConfig, SimulationContext};
use crate::debug::DebugUi;
use crate::ecs::components::{Collider, PowerUpComponent, RigidDynamicComponent, VehicleComponent, VehicleError};
use crate::ecs::{Component, World};
use crate::events::{Event, EventArg, EventType};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::{BodyContext, ContactEvent, PhysicsBody, PhysicsError, PhysicsWorld};
use crate::scene::SceneGraph;

new_key_type! {
    /// Handle of a body registered with a [`Simulation`]
    pub struct BodyKey;
}

/// A registered body
#[derive(Debug)]
pub enum Body {
    /// Ray-cast vehicle
    Vehicle(Box<VehicleComponent>),
    /// Plain dynamic or static rigid body
    Rigid(RigidDynamicComponent),
    /// Trigger pickup
    PowerUp(PowerUpComponent),
}

impl Body {
    /// Physics capabilities of the body
    pub fn as_physics_body(&self) -> &dyn PhysicsBody {
        match self {
            Body::Vehicle(vehicle) => &**vehicle,
            Body::Rigid(rigid) => rigid,
            Body::PowerUp(power_up) => power_up,
        }
    }

    /// Mutable physics capabilities of the body
    pub fn as_physics_body_mut(&mut self) -> &mut dyn PhysicsBody {
        match self {
            Body::Vehicle(vehicle) => &mut **vehicle,
            Body::Rigid(rigid) => rigid,
            Body::PowerUp(power_up) => power_up,
        }
    }

    fn as_component_mut(&mut self) -> &mut dyn Component {
        match self {
            Body::Vehicle(vehicle) => &mut **vehicle,
            Body::Rigid(rigid) => rigid,
            Body::PowerUp(power_up) => power_up,
        }
    }

    /// Live shapes attached to the body's actor
    pub fn shapes(&self) -> Vec<ColliderHandle> {
        match self {
            Body::Vehicle(vehicle) => vehicle
                .chassis()
                .colliders()
                .iter()
                .chain(vehicle.wheel_colliders())
                .filter_map(Collider::shape)
                .collect(),
            Body::Rigid(rigid) => rigid.colliders().iter().filter_map(Collider::shape).collect(),
            Body::PowerUp(power_up) => power_up.colliders().iter().filter_map(Collider::shape).collect(),
        }
    }

    fn release(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        match self {
            Body::Vehicle(vehicle) => vehicle.release(physics, scene),
            Body::Rigid(rigid) => rigid.release(physics),
            Body::PowerUp(power_up) => power_up.release(physics),
        }
    }
}

/// Entity world, physics world and body registry stepped together
pub struct Simulation {
    world: World,
    physics: PhysicsWorld,
    bodies: SlotMap<BodyKey, Body>,
    shape_owners: HashMap<ColliderHandle, BodyKey>,
    events: Vec<Event>,
    ctx: SimulationContext,
    vehicles_spawned: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl Simulation {
    /// Empty simulation at time zero stepping by the configured fixed timestep
    pub fn new(config: &SimulationConfig) -> Self {
        let mut ctx = SimulationContext::new(config.physics.fixed_timestep);
        ctx.render_target = config.render_target.clone();

        Self {
            world: World::new(),
            physics: PhysicsWorld::new(config),
            bodies: SlotMap::with_key(),
            shape_owners: HashMap::new(),
            events: Vec::new(),
            ctx,
            vehicles_spawned: 0,
        }
    }

    /// Create an entity at `transform`, build the vehicle rig on it and register it.
    ///
    /// Every vehicle gets its own raycast group bit so its suspension rays
    /// skip its own shapes.
    pub fn spawn_vehicle(&mut self, vehicle: VehicleComponent, transform: Transform) -> Result<BodyKey, VehicleError> {
        let raycast_group = 1u32 << (self.vehicles_spawned % 32);
        let mut vehicle = vehicle.with_raycast_group(raycast_group);

        let (entity, key) = self.world.spawn(transform);
        vehicle.set_entity(entity, &mut self.world, &self.ctx);
        if let Err(err) = vehicle.create_vehicle(&mut self.physics, &mut self.world.scene, key) {
            self.world.destroy_entity(entity);
            return Err(err);
        }

        self.vehicles_spawned += 1;
        Ok(self.register(Body::Vehicle(Box::new(vehicle))))
    }

    /// Create an entity at `transform` and build the rigid body on it
    pub fn spawn_rigid(&mut self, mut rigid: RigidDynamicComponent, transform: Transform) -> Result<BodyKey, PhysicsError> {
        let (entity, key) = self.world.spawn(transform);
        rigid.set_entity(entity, &mut self.world, &self.ctx);
        if let Err(err) = rigid.create_actor(&mut self.physics, &self.world.scene, key) {
            self.world.destroy_entity(entity);
            return Err(err);
        }
        Ok(self.register(Body::Rigid(rigid)))
    }

    /// Create an entity at `transform` and build the pickup trigger on it
    pub fn spawn_power_up(&mut self, mut power_up: PowerUpComponent, transform: Transform) -> Result<BodyKey, PhysicsError> {
        let (entity, key) = self.world.spawn(transform);
        power_up.set_entity(entity, &mut self.world, &self.ctx);
        if let Err(err) = power_up.create_actor(&mut self.physics, &self.world.scene, key) {
            self.world.destroy_entity(entity);
            return Err(err);
        }
        Ok(self.register(Body::PowerUp(power_up)))
    }

    fn register(&mut self, body: Body) -> BodyKey {
        let shapes = body.shapes();
        let key = self.bodies.insert(body);
        for shape in shapes {
            self.shape_owners.insert(shape, key);
        }
        log::debug!("Body {:?} registered, {} bodies live", key, self.bodies.len());
        key
    }

    /// Remove a body from the world together with its entity
    pub fn despawn(&mut self, key: BodyKey) -> bool {
        let Some(mut body) = self.bodies.remove(key) else {
            log::trace!("Despawn of unknown body {:?} ignored", key);
            return false;
        };
        for shape in body.shapes() {
            self.shape_owners.remove(&shape);
        }
        let entity = body.as_physics_body().entity();
        body.release(&mut self.physics, &mut self.world.scene);
        if let Some(entity) = entity {
            self.world.destroy_entity(entity);
        }
        true
    }

    /// Advance everything by one step of `context().delta` seconds
    pub fn step(&mut self) {
        let first_event = self.events.len();

        self.physics.update_query_pipeline();
        for body in self.bodies.values_mut() {
            if let Body::Vehicle(vehicle) = body {
                vehicle.update_controls(&mut self.physics, &self.ctx);
            }
        }

        let contacts = self.physics.step(self.ctx.delta);
        for contact in &contacts {
            self.dispatch(contact);
        }

        for body in self.bodies.values_mut() {
            body.as_physics_body_mut()
                .update_from_physics(&mut self.physics, &mut self.world.scene);
        }

        for body in self.bodies.values_mut() {
            if let Body::Vehicle(vehicle) = body {
                vehicle.update_particles(&self.ctx, &self.world.scene);
            }
        }

        let collected: Vec<BodyKey> = self
            .bodies
            .iter()
            .filter(|(_, body)| matches!(body, Body::PowerUp(power_up) if power_up.is_consumed()))
            .map(|(key, _)| key)
            .collect();
        for key in collected {
            self.despawn(key);
        }

        self.route_events(first_event);
        self.ctx.advance();
    }

    fn dispatch(&mut self, contact: &ContactEvent) {
        let (Some(&a), Some(&b)) = (
            self.shape_owners.get(&contact.collider1),
            self.shape_owners.get(&contact.collider2),
        ) else {
            log::trace!("Contact between unregistered shapes ignored");
            return;
        };
        if a == b {
            return;
        }
        let Some([first, second]) = self.bodies.get_disjoint_mut([a, b]) else { return };

        let mut ctx = BodyContext {
            sim: &self.ctx,
            scene: &self.world.scene,
            events: &mut self.events,
        };
        let (first, second) = (first.as_physics_body_mut(), second.as_physics_body_mut());
        if contact.sensor {
            first.on_trigger(second, &mut ctx);
            second.on_trigger(first, &mut ctx);
        } else {
            first.on_contact(second, &mut ctx);
            second.on_contact(first, &mut ctx);
        }
    }

    fn route_events(&mut self, first_event: usize) {
        if first_event >= self.events.len() {
            return;
        }
        let raised = self.events[first_event..].to_vec();
        for event in &raised {
            log::debug!("{:?} at {:.2}s", event.event_type, event.timestamp);
            for body in self.bodies.values_mut() {
                body.as_component_mut().handle_event(event);
            }
        }
    }

    /// Fire a vehicle's boost; false during its cooldown or for a non-vehicle
    pub fn boost(&mut self, key: BodyKey, direction: Vec3) -> bool {
        let Some(Body::Vehicle(vehicle)) = self.bodies.get_mut(key) else {
            log::trace!("Boost for non-vehicle body {:?} ignored", key);
            return false;
        };
        if !vehicle.boost(direction, &mut self.physics, &self.world.scene, &self.ctx) {
            return false;
        }
        let event = Event::new(EventType::BoostFired, self.ctx.time.seconds())
            .with_entity("vehicle", vehicle.entity())
            .with_arg("direction", EventArg::Direction(vehicle.combat().boost_direction()));
        self.events.push(event);
        true
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Registered body
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Registered vehicle
    pub fn vehicle(&self, key: BodyKey) -> Option<&VehicleComponent> {
        match self.bodies.get(key) {
            Some(Body::Vehicle(vehicle)) => Some(&**vehicle),
            _ => None,
        }
    }

    /// Registered vehicle, for input
    pub fn vehicle_mut(&mut self, key: BodyKey) -> Option<&mut VehicleComponent> {
        match self.bodies.get_mut(key) {
            Some(Body::Vehicle(vehicle)) => Some(&mut **vehicle),
            _ => None,
        }
    }

    /// Keys of all registered vehicles
    pub fn vehicle_keys(&self) -> Vec<BodyKey> {
        self.bodies
            .iter()
            .filter(|(_, body)| matches!(body, Body::Vehicle(_)))
            .map(|(key, _)| key)
            .collect()
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// World pose of a body's entity
    pub fn transform(&self, key: BodyKey) -> Option<Transform> {
        let entity = self.bodies.get(key)?.as_physics_body().entity()?;
        self.world.transform(entity)
    }

    /// Clock of the next step
    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Entities and the scene graph
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Transform hierarchy
    pub fn scene(&self) -> &SceneGraph {
        &self.world.scene
    }

    /// Physics world
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Mutable physics world
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Inspect every vehicle
    pub fn render_debug_gui(&mut self, ui: &mut dyn DebugUi) {
        ui.label("Time", &format!("{:.2}", self.ctx.time.seconds()));
        ui.label("Bodies", &self.bodies.len().to_string());
        for (key, body) in &mut self.bodies {
            if let Body::Vehicle(vehicle) = body {
                if ui.tree_node(&format!("Vehicle {:?}", key)) {
                    vehicle.render_debug_gui(ui, &mut self.physics);
                    ui.tree_pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::RecordingUi;
    use crate::ecs::components::{PowerUp, PowerUpKind, VehicleAssets};
    use crate::physics::{ColliderGeometry, QueryFilterType};
    use approx::assert_relative_eq;

    fn ground(simulation: &Simulation) -> RigidDynamicComponent {
        let floor = Collider::new(
            "Ground",
            simulation.physics().materials().get("Asphalt"),
            QueryFilterType::DrivableSurface.filter_data(),
            ColliderGeometry::cuboid(Vec3::new(200.0, 1.0, 200.0)),
        );
        RigidDynamicComponent::new_static().with_collider(floor)
    }

    fn arena() -> (Simulation, VehicleAssets) {
        let mut simulation = Simulation::default();
        let floor = ground(&simulation);
        simulation
            .spawn_rigid(floor, Transform::from_position(Vec3::new(0.0, -0.5, 0.0)))
            .unwrap();
        let assets = VehicleAssets::headless(simulation.physics());
        (simulation, assets)
    }

    fn vehicle_at(simulation: &mut Simulation, assets: &VehicleAssets, position: Vec3) -> BodyKey {
        let vehicle = VehicleComponent::new(4, true, assets).unwrap();
        simulation.spawn_vehicle(vehicle, Transform::from_position(position)).unwrap()
    }

    #[test]
    fn test_vehicles_get_distinct_raycast_groups() {
        let (mut simulation, assets) = arena();
        let a = vehicle_at(&mut simulation, &assets, Vec3::new(-5.0, 1.0, 0.0));
        let b = vehicle_at(&mut simulation, &assets, Vec3::new(5.0, 1.0, 0.0));

        let group_a = simulation.vehicle(a).unwrap().raycast_group();
        let group_b = simulation.vehicle(b).unwrap().raycast_group();
        assert_ne!(group_a, group_b);
        assert_eq!(group_a.count_ones(), 1);
        assert_eq!(simulation.vehicle_keys().len(), 2);
    }

    #[test]
    fn test_step_moves_entity_transform() {
        let (mut simulation, assets) = arena();
        let key = vehicle_at(&mut simulation, &assets, Vec3::new(0.0, 3.0, 0.0));

        for _ in 0..10 {
            simulation.step();
        }

        let transform = simulation.transform(key).unwrap();
        assert!(transform.position.y < 3.0);
        assert_relative_eq!(simulation.context().time.seconds(), 10.0 / 60.0, epsilon = 1e-6);
    }

    #[test]
    fn test_failed_spawn_leaves_no_entity() {
        let (mut simulation, assets) = arena();
        let entities = simulation.world().len();
        let mut descriptor = VehicleComponent::new(4, true, &assets).unwrap().descriptor().clone();
        descriptor.chassis_size = Vec3::new(0.0, 1.0, 5.0);
        let vehicle = VehicleComponent::from_descriptor(descriptor, &assets).unwrap();

        let result = simulation.spawn_vehicle(vehicle, Transform::identity());

        assert!(result.is_err());
        assert_eq!(simulation.world().len(), entities);
        assert_eq!(simulation.body_count(), 1);
    }

    #[test]
    fn test_driving_through_power_up_collects_it() {
        let (mut simulation, assets) = arena();
        let key = vehicle_at(&mut simulation, &assets, Vec3::new(0.0, 1.0, 0.0));
        let pickup = PowerUpComponent::new(PowerUp::new(PowerUpKind::Damage), 1.5, simulation.physics());
        let pickup_key = simulation
            .spawn_power_up(pickup, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();

        for _ in 0..5 {
            simulation.step();
        }

        let events = simulation.drain_events();
        let collected: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == EventType::PowerUpCollected)
            .collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].get_power_up(), Some(PowerUpKind::Damage));
        assert!(simulation.body(pickup_key).is_none());
        let ctx = simulation.context().clone();
        assert_relative_eq!(simulation.vehicle(key).unwrap().base_damage(&ctx), 2.0);
    }

    #[test]
    fn test_boost_raises_event_once_per_cooldown() {
        let (mut simulation, assets) = arena();
        let key = vehicle_at(&mut simulation, &assets, Vec3::new(0.0, 1.0, 0.0));

        assert!(simulation.boost(key, Vec3::z()));
        simulation.step();
        assert!(!simulation.boost(key, Vec3::z()));

        let events = simulation.drain_events();
        let boosts: Vec<_> = events.iter().filter(|e| e.event_type == EventType::BoostFired).collect();
        assert_eq!(boosts.len(), 1);
        assert_eq!(boosts[0].get_direction(), Some(Vec3::z()));
        assert!(simulation.drain_events().is_empty());
    }

    #[test]
    fn test_despawn_releases_rig() {
        let (mut simulation, assets) = arena();
        let bodies = simulation.physics().body_count();
        let colliders = simulation.physics().collider_count();
        let key = vehicle_at(&mut simulation, &assets, Vec3::new(0.0, 1.0, 0.0));

        assert!(simulation.despawn(key));

        assert!(!simulation.despawn(key));
        assert_eq!(simulation.physics().body_count(), bodies);
        assert_eq!(simulation.physics().collider_count(), colliders);
        assert_eq!(simulation.scene().len(), 1);
    }

    #[test]
    fn test_debug_gui_lists_vehicles() {
        let (mut simulation, assets) = arena();
        vehicle_at(&mut simulation, &assets, Vec3::new(0.0, 1.0, 0.0));
        let mut ui = RecordingUi::new();

        simulation.render_debug_gui(&mut ui);

        assert!(ui.contains("Bodies: 2"));
        assert!(ui.contains("Wheel Count: 4"));
    }
}
