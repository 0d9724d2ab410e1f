//! # Vehicle Component
//!
//! Couples a ray-cast vehicle solver to a chassis rigid body and the
//! gameplay state of a combat vehicle.
//!
//! ## Wheels
//!
//! Wheel meshes, wheel colliders and wheel particle emitters are kept in
//! three vectors index-aligned with the solver's wheels. After every physics
//! step [`VehicleComponent::update_wheel_transforms`] re-derives each wheel's
//! chassis-local pose from the solver and pushes it into all three.
//!
//! ## Step order
//!
//! 1. [`VehicleComponent::update_controls`]: raw input to solver controls,
//!    then the solver's suspension and friction update
//! 2. physics step
//! 3. contact dispatch ([`PhysicsBody::on_contact`] / [`PhysicsBody::on_trigger`])
//! 4. [`PhysicsBody::update_from_physics`]: chassis pose and wheel sync

pub mod combat;
pub mod descriptor;
pub mod input;
pub mod wheels;

pub use combat::{CombatState, POWER_UP_DURATION};
pub use descriptor::{AxleData, VehicleDescriptor, VehicleTuning, DEFAULT_AXLES};
pub use input::{DriveControls, InputMode, InputSmoother, VehicleRawInput};

use std::sync::Arc;

use rapier3d::control::{DynamicRayCastVehicleController, WheelTuning};
use rapier3d::prelude::{MassProperties, RigidBodyBuilder, RigidBodyHandle};
use thiserror::Error;

use super::collider::Collider;
use super::mesh::{MeshAsset, MeshComponent};
use super::particle_emitter::ParticleEmitterComponent;
use super::power_up::{PowerUp, PowerUpKind};
use super::rigid_dynamic::RigidDynamicComponent;
use crate::config::ConfigDocument;
use crate::core::SimulationContext;
use crate::debug::DebugUi;
use crate::ecs::{Component, ComponentType, Entity, World};
use crate::events::{Event, EventArg, EventType};
use crate::foundation::math::{axes, utils, Isometry, Point3, Transform, Vec3};
use crate::physics::{
    BodyContext, ColliderGeometry, DamageOutcome, Damageable, PhysicsBody, PhysicsError, PhysicsMaterial, PhysicsWorld,
    QueryFilterData, QueryFilterType,
};
use crate::render::{GraphicsDevice, HeadlessDevice, RenderError};
use crate::scene::{SceneGraph, TransformKey};

/// Collision group of wheel shapes
pub const WHEEL_GROUP: &str = "Wheels";

/// Vehicle construction errors
#[derive(Error, Debug)]
pub enum VehicleError {
    /// The chassis body or one of its shapes could not be created
    #[error("Vehicle rig creation failed: {0}")]
    Physics(#[from] PhysicsError),

    /// Wheel emitter vertex storage could not be created
    #[error("Vehicle wheel emitter creation failed: {0}")]
    Render(#[from] RenderError),
}

/// Shared resources every vehicle is built from
#[derive(Clone)]
pub struct VehicleAssets {
    /// Prefab instanced once per wheel
    pub wheel_mesh: Arc<MeshAsset>,
    /// Device owning the wheel emitters' vertex storage
    pub device: Arc<dyn GraphicsDevice>,
    /// Surface material of chassis and wheel shapes
    pub material: Arc<PhysicsMaterial>,
}

impl VehicleAssets {
    /// Bundle shared resources
    pub fn new(wheel_mesh: Arc<MeshAsset>, device: Arc<dyn GraphicsDevice>, material: Arc<PhysicsMaterial>) -> Self {
        Self {
            wheel_mesh,
            device,
            material,
        }
    }

    /// Assets backed by a [`HeadlessDevice`] and the world's `Metal` material
    pub fn headless(physics: &PhysicsWorld) -> Self {
        Self::new(
            MeshAsset::new("Wheel", "Rubber", Vec3::new(0.2, 0.5, 0.5)),
            Arc::new(HeadlessDevice::new()),
            physics.materials().get("Metal"),
        )
    }
}

/// Static per-wheel data, index-aligned with the solver wheels
#[derive(Debug, Clone, PartialEq)]
pub struct WheelSimulationData {
    /// Wheel centre at rest, chassis-local
    pub offset: Vec3,
    /// Radius (m)
    pub radius: f32,
    /// Width (m)
    pub width: f32,
    /// Mass (kg)
    pub mass: f32,
    /// Moment of inertia about the axle
    pub moment_of_inertia: f32,
    /// Wheel is on the front axle and steers
    pub steered: bool,
    /// Wheel is on a rear axle and takes the handbrake
    pub handbraked: bool,
}

/// Combat vehicle: chassis body, wheel solver, wheel visuals and gameplay state
pub struct VehicleComponent {
    descriptor: VehicleDescriptor,
    chassis: RigidDynamicComponent,
    controller: Option<DynamicRayCastVehicleController>,
    wheels: Vec<WheelSimulationData>,
    wheel_meshes: Vec<MeshComponent>,
    wheel_colliders: Vec<Collider>,
    wheel_emitters: Vec<ParticleEmitterComponent>,
    assets: VehicleAssets,
    raw_input: VehicleRawInput,
    smoother: InputSmoother,
    controls: DriveControls,
    combat: CombatState,
    in_air: bool,
    raycast_group: u32,
    solver_chassis_pose: Option<Isometry>,
}

impl VehicleComponent {
    /// Read a vehicle document; malformed or missing keys use defaults
    pub fn from_config(doc: &ConfigDocument, assets: &VehicleAssets) -> Result<Self, VehicleError> {
        Self::from_descriptor(VehicleDescriptor::from_config(doc), assets)
    }

    /// Vehicle with `wheel_count` wheels and every other value at its default
    pub fn new(wheel_count: usize, input_type_digital: bool, assets: &VehicleAssets) -> Result<Self, VehicleError> {
        let descriptor = VehicleDescriptor {
            wheel_count,
            input_mode: if input_type_digital { InputMode::Digital } else { InputMode::Analog },
            ..VehicleDescriptor::default()
        };
        Self::from_descriptor(descriptor, assets)
    }

    /// Build from a prepared descriptor
    pub fn from_descriptor(descriptor: VehicleDescriptor, assets: &VehicleAssets) -> Result<Self, VehicleError> {
        let combat = CombatState::new(descriptor.health, descriptor.max_health, descriptor.resistance, descriptor.base_damage)
            .with_boost(descriptor.boost_power, descriptor.boost_cooldown);

        let mut vehicle = Self {
            descriptor,
            chassis: RigidDynamicComponent::new(),
            controller: None,
            wheels: Vec::new(),
            wheel_meshes: Vec::new(),
            wheel_colliders: Vec::new(),
            wheel_emitters: Vec::new(),
            assets: assets.clone(),
            raw_input: VehicleRawInput::default(),
            smoother: InputSmoother::default(),
            controls: DriveControls::default(),
            combat,
            in_air: true,
            raycast_group: 1,
            solver_chassis_pose: None,
        };
        vehicle.initialize()?;
        Ok(vehicle)
    }

    /// Builder pattern: raycast group bits shared by this vehicle's shapes and rays
    pub fn with_raycast_group(mut self, raycast_group: u32) -> Self {
        self.raycast_group = raycast_group;
        let filter = QueryFilterType::NonDrivableSurface.filter_data().with_raycast_group(raycast_group);
        self.chassis = RigidDynamicComponent::new().with_collider(self.chassis_collider(filter));
        self.wheel_colliders = self.wheels.iter().map(|wheel| self.wheel_collider(wheel, filter)).collect();
        self
    }

    /// Lay out axles and allocate the per-wheel data, meshes, colliders and emitters.
    ///
    /// Must run before [`Self::create_vehicle`]; the constructors call it.
    pub fn initialize(&mut self) -> Result<(), VehicleError> {
        let wheel_count = wheels::normalize_wheel_count(self.descriptor.wheel_count);
        let axles = wheels::layout_axles(&self.descriptor.axles, wheel_count, self.descriptor.chassis_size.z);
        let offsets = wheels::wheel_offsets(&axles, self.descriptor.chassis_size);
        self.descriptor.wheel_count = wheel_count;
        self.descriptor.axles = axles;

        let moment_of_inertia = self.descriptor.wheel_moment_of_inertia();
        self.wheels = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| WheelSimulationData {
                offset: *offset,
                radius: self.descriptor.wheel_radius,
                width: self.descriptor.wheel_width,
                mass: self.descriptor.wheel_mass,
                moment_of_inertia,
                steered: i < 2,
                handbraked: i >= 2,
            })
            .collect();

        let filter = QueryFilterType::NonDrivableSurface.filter_data().with_raycast_group(self.raycast_group);
        self.chassis = RigidDynamicComponent::new().with_collider(self.chassis_collider(filter));
        self.wheel_colliders = self.wheels.iter().map(|wheel| self.wheel_collider(wheel, filter)).collect();
        self.wheel_meshes = offsets
            .iter()
            .map(|offset| MeshComponent::new(Arc::clone(&self.assets.wheel_mesh)).with_local(Transform::from_position(*offset)))
            .collect();
        self.wheel_emitters = offsets
            .iter()
            .map(|offset| {
                ParticleEmitterComponent::new(self.descriptor.wheel_emitter.clone(), Arc::clone(&self.assets.device))
                    .map(|emitter| emitter.with_local(Transform::from_position(*offset)))
            })
            .collect::<Result<_, _>>()?;

        log::debug!(
            "Vehicle initialized: {} wheels on {} axles",
            wheel_count,
            self.descriptor.axles.len()
        );
        Ok(())
    }

    fn chassis_collider(&self, filter: QueryFilterData) -> Collider {
        Collider::new(
            self.descriptor.collision_group.clone(),
            Arc::clone(&self.assets.material),
            filter,
            ColliderGeometry::cuboid(self.descriptor.chassis_size),
        )
        .with_density(0.0)
    }

    fn wheel_collider(&self, wheel: &WheelSimulationData, filter: QueryFilterData) -> Collider {
        Collider::new(
            WHEEL_GROUP,
            Arc::clone(&self.assets.material),
            filter,
            ColliderGeometry::ConvexMesh {
                points: wheels::wheel_hull_points(wheel.radius, wheel.width),
            },
        )
        .with_local_transform(Transform::from_position(wheel.offset))
        .with_density(0.0)
    }

    /// Build the chassis body at the pose of `transform`, attach chassis and
    /// wheel shapes, create the solver and parent wheel meshes and emitters
    /// to `transform`.
    ///
    /// On failure everything created here is removed again.
    pub fn create_vehicle(
        &mut self,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        transform: TransformKey,
    ) -> Result<RigidBodyHandle, VehicleError> {
        self.release(physics, scene);

        let mass_properties = MassProperties::new(
            Point3::from(self.descriptor.chassis_center_of_mass_offset()),
            self.descriptor.chassis_mass,
            self.descriptor.chassis_moment_of_inertia(),
        );
        let builder = RigidBodyBuilder::dynamic()
            .additional_mass_properties(mass_properties)
            .ccd_enabled(true);
        let actor = self.chassis.create_actor_with(physics, scene, transform, builder)?;

        for i in 0..self.wheel_colliders.len() {
            if let Err(err) = self.wheel_colliders[i].create_shape(actor, physics) {
                log::warn!("Wheel {} shape creation failed: {}", i, err);
                self.chassis.release(physics);
                self.wheel_colliders.iter_mut().for_each(Collider::forget_shape);
                return Err(err.into());
            }
        }

        self.controller = Some(DynamicRayCastVehicleController::new(actor));
        let offsets: Vec<Vec3> = self.wheels.iter().map(|wheel| wheel.offset).collect();
        self.initialize_wheels_simulation_data(&offsets);

        for mesh in &mut self.wheel_meshes {
            mesh.attach(scene, Some(transform));
        }
        for emitter in &mut self.wheel_emitters {
            emitter.attach(scene, Some(transform));
        }

        log::info!(
            "Vehicle created: {} wheels, chassis {:.0} kg, raycast group {:#x}",
            self.wheels.len(),
            self.descriptor.chassis_mass,
            self.raycast_group
        );
        Ok(actor)
    }

    /// Place the solver wheels at `offsets` (chassis-local rest centres) and
    /// push the suspension and tyre tuning into the solver in index order
    pub fn initialize_wheels_simulation_data(&mut self, offsets: &[Vec3]) {
        if offsets.len() != self.wheels.len() {
            log::warn!(
                "Ignoring {} wheel offsets for a vehicle with {} wheels",
                offsets.len(),
                self.wheels.len()
            );
            return;
        }
        let Some(chassis) = self.controller.as_ref().map(|controller| controller.chassis) else {
            log::trace!("Wheel data kept until the vehicle is created");
            for (wheel, offset) in self.wheels.iter_mut().zip(offsets) {
                wheel.offset = *offset;
            }
            return;
        };

        let tuning: WheelTuning = self.descriptor.tuning.wheel_tuning();
        let rest_length = self.descriptor.tuning.suspension_rest_length;
        let mut controller = DynamicRayCastVehicleController::new(chassis);
        controller.index_up_axis = 1;
        controller.index_forward_axis = 2;

        for (wheel, offset) in self.wheels.iter_mut().zip(offsets) {
            wheel.offset = *offset;
            // the suspension hangs from above the rest centre
            let connection = Point3::from(*offset + axes::up() * rest_length);
            controller.add_wheel(connection, -axes::up(), -Vec3::x(), rest_length, wheel.radius, &tuning);
        }

        self.controller = Some(controller);
        self.solver_chassis_pose = None;
    }

    /// Remove the rig from the world and the wheel nodes from the scene
    pub fn release(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        self.chassis.release(physics);
        self.wheel_colliders.iter_mut().for_each(Collider::forget_shape);
        for mesh in &mut self.wheel_meshes {
            mesh.detach(scene);
        }
        for emitter in &mut self.wheel_emitters {
            emitter.detach(scene);
        }
        self.controller = None;
        self.solver_chassis_pose = None;
    }

    /// Steering in [-1, 1], positive to the left
    pub fn steer(&mut self, amount: f32) {
        self.raw_input.set_steer(amount);
    }

    /// Throttle and brake/reverse in [0, 1]
    pub fn handle_acceleration(&mut self, forward: f32, backward: f32) {
        self.raw_input.set_acceleration(forward, backward);
    }

    /// Handbrake in [0, 1]
    pub fn handbrake(&mut self, amount: f32) {
        self.raw_input.set_handbrake(amount);
    }

    /// Convert the raw input into solver controls and run the solver's
    /// suspension and friction update for this step
    pub fn update_controls(&mut self, physics: &mut PhysicsWorld, ctx: &SimulationContext) {
        if self.combat.expire(ctx.time) {
            log::debug!("Vehicle power-up expired at {:.2}s", ctx.time.seconds());
        }
        if !(ctx.delta > 0.0) {
            return;
        }
        let Some(actor) = self.chassis.body_handle() else { return };
        let Some(controller) = self.controller.as_mut() else { return };

        let (pose, forward_speed) = match physics.body_mut(actor) {
            Some(body) => {
                let forward = body.rotation() * axes::forward();
                let pose = *body.position();
                body.reset_forces(false);
                if self.descriptor.down_force != Vec3::zeros() {
                    body.add_force(self.descriptor.down_force, true);
                }
                (pose, body.linvel().dot(&forward))
            }
            None => {
                log::trace!("Vehicle update skipped, chassis {:?} is gone", actor);
                return;
            }
        };

        let controls = self
            .smoother
            .update(&self.raw_input, self.descriptor.input_mode, forward_speed, ctx.delta);
        let tuning = &self.descriptor.tuning;
        let wheel_count = self.wheels.len().max(1) as f32;
        let engine_force = controls.throttle * tuning.max_engine_force * self.combat.speed_multiplier(ctx.time) / wheel_count;

        for (wheel, data) in controller.wheels_mut().iter_mut().zip(&self.wheels) {
            wheel.engine_force = engine_force;
            wheel.steering = if data.steered { controls.steer * tuning.max_steer_angle } else { 0.0 };
            let mut brake = controls.brake * tuning.max_brake_force;
            if data.handbraked {
                brake += controls.handbrake * tuning.max_handbrake_force;
            }
            // the solver caps its rolling impulse at the brake value
            wheel.brake = brake * ctx.delta;
        }

        if controls != DriveControls::default() {
            if let Some(body) = physics.body_mut(actor) {
                body.wake_up(true);
            }
        }

        self.solver_chassis_pose = Some(pose);
        physics.update_vehicle_controller(controller, ctx.delta, self.raycast_group);
        self.in_air = controller.wheels().iter().all(|wheel| wheel.wheel_suspension_force <= 0.0);
        self.controls = controls;
    }

    /// Write each solver wheel pose into wheel mesh `i`, wheel collider `i`
    /// and wheel emitter `i`
    pub fn update_wheel_transforms(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        for i in 0..self.wheels.len() {
            let Some(pose) = self.wheel_pose(i) else { continue };
            self.wheel_meshes[i].set_local_transform(scene, pose);
            self.wheel_colliders[i].set_local_transform(pose, physics);
            // emission cones follow steering and spin
            self.wheel_emitters[i].set_local_transform(scene, pose);
        }
    }

    /// Age and spawn wheel particles
    pub fn update_particles(&mut self, ctx: &SimulationContext, scene: &SceneGraph) {
        for emitter in &mut self.wheel_emitters {
            emitter.update(ctx, scene);
        }
    }

    /// Fire a boost along `direction` (the chassis forward if zero).
    ///
    /// Returns false without any effect while the cooldown runs or before
    /// the vehicle is created.
    pub fn boost(&mut self, direction: Vec3, physics: &mut PhysicsWorld, scene: &SceneGraph, ctx: &SimulationContext) -> bool {
        if !self.combat.can_boost(ctx.time) {
            log::trace!("Boost ignored, cooling down");
            return false;
        }
        let Some(body) = self.chassis.body_handle().and_then(|actor| physics.body_mut(actor)) else {
            log::trace!("Boost ignored, vehicle has no chassis body");
            return false;
        };

        let direction = direction
            .try_normalize(1.0e-6)
            .unwrap_or_else(|| body.rotation() * axes::forward());
        body.apply_impulse(direction * self.combat.boost_power() * self.descriptor.chassis_mass, true);
        self.combat.record_boost(direction, ctx.time);

        for emitter in &mut self.wheel_emitters {
            let count = emitter.settings().emit_count;
            emitter.emit(count, scene);
        }
        log::debug!("Boost fired along {:?}", direction);
        true
    }

    /// Apply damage scaled by the current resistance
    pub fn take_damage(&mut self, damager: Option<Entity>, damage: f32, ctx: &SimulationContext) -> DamageOutcome {
        let outcome = self.combat.take_damage(damage, ctx.time);
        if outcome.destroyed {
            log::info!("Vehicle {:?} destroyed by {:?}", self.chassis.entity(), damager);
        }
        outcome
    }

    /// Heal, clamped to the maximum health
    pub fn add_health(&mut self, amount: f32) {
        self.combat.add_health(amount);
    }

    /// Power-up: override resistance
    pub fn set_resistance(&mut self, value: f32, ctx: &SimulationContext) {
        self.combat.set_resistance(value, ctx.time);
    }

    /// Power-up: override contact damage
    pub fn set_base_damage(&mut self, value: f32, ctx: &SimulationContext) {
        self.combat.set_base_damage(value, ctx.time);
    }

    /// Power-up: scale engine force
    pub fn apply_speed_multiplier(&mut self, value: f32, ctx: &SimulationContext) {
        self.combat.apply_speed_multiplier(value, ctx.time);
    }

    /// Power-up: scale incoming damage
    pub fn apply_defence_multiplier(&mut self, value: f32, ctx: &SimulationContext) {
        self.combat.apply_defence_multiplier(value, ctx.time);
    }

    /// Apply a collected power-up
    pub fn apply_power_up(&mut self, power_up: PowerUp, ctx: &SimulationContext) {
        log::debug!("Power-up {} ({}) applied", power_up.kind.name(), power_up.value);
        match power_up.kind {
            PowerUpKind::Speed => self.apply_speed_multiplier(power_up.value, ctx),
            PowerUpKind::Defence => self.apply_defence_multiplier(power_up.value, ctx),
            PowerUpKind::Damage => self.set_base_damage(power_up.value, ctx),
            PowerUpKind::Health => self.add_health(power_up.value),
        }
    }

    /// Constant force applied to the chassis every step
    pub fn set_downforce(&mut self, down_force: Vec3) {
        self.descriptor.down_force = down_force;
    }

    /// Pose of wheel `index` relative to the chassis; the rest pose until the solver has run
    pub fn wheel_pose(&self, index: usize) -> Option<Transform> {
        let data = self.wheels.get(index)?;
        let solver_wheel = self.controller.as_ref().and_then(|controller| controller.wheels().get(index));
        match (solver_wheel, self.solver_chassis_pose) {
            (Some(wheel), Some(chassis_pose)) => Some(wheels::wheel_local_pose(&chassis_pose, wheel)),
            _ => Some(Transform::from_position(data.offset)),
        }
    }

    /// Poses of all wheels in index order
    pub fn wheel_poses(&self) -> Vec<Transform> {
        (0..self.wheels.len()).filter_map(|i| self.wheel_pose(i)).collect()
    }

    /// Chassis velocity along its forward axis (m/s)
    pub fn forward_speed(&self, physics: &PhysicsWorld) -> f32 {
        self.chassis
            .body_handle()
            .and_then(|actor| physics.body(actor))
            .map_or(0.0, |body| body.linvel().dot(&(body.rotation() * axes::forward())))
    }

    /// Parameters the vehicle was built from
    pub fn descriptor(&self) -> &VehicleDescriptor {
        &self.descriptor
    }

    /// Chassis body facet
    pub fn chassis(&self) -> &RigidDynamicComponent {
        &self.chassis
    }

    /// Chassis mass (kg)
    pub fn chassis_mass(&self) -> f32 {
        self.descriptor.chassis_mass
    }

    /// Chassis box size (width, height, length)
    pub fn chassis_size(&self) -> Vec3 {
        self.descriptor.chassis_size
    }

    /// Chassis principal moments of inertia
    pub fn chassis_moment_of_inertia(&self) -> Vec3 {
        self.descriptor.chassis_moment_of_inertia()
    }

    /// Centre of mass relative to the chassis origin
    pub fn chassis_center_of_mass_offset(&self) -> Vec3 {
        self.descriptor.chassis_center_of_mass_offset()
    }

    /// Mass of one wheel (kg)
    pub fn wheel_mass(&self) -> f32 {
        self.descriptor.wheel_mass
    }

    /// Wheel radius (m)
    pub fn wheel_radius(&self) -> f32 {
        self.descriptor.wheel_radius
    }

    /// Wheel width (m)
    pub fn wheel_width(&self) -> f32 {
        self.descriptor.wheel_width
    }

    /// Moment of inertia of one wheel about its axle
    pub fn wheel_moment_of_inertia(&self) -> f32 {
        self.descriptor.wheel_moment_of_inertia()
    }

    /// Number of wheels
    pub fn wheel_count(&self) -> usize {
        self.wheels.len()
    }

    /// Axles front to back
    pub fn axle_data(&self) -> &[AxleData] {
        &self.descriptor.axles
    }

    /// Per-wheel simulation data
    pub fn wheels(&self) -> &[WheelSimulationData] {
        &self.wheels
    }

    /// Wheel meshes, index-aligned with the solver wheels
    pub fn wheel_meshes(&self) -> &[MeshComponent] {
        &self.wheel_meshes
    }

    /// Wheel colliders, index-aligned with the solver wheels
    pub fn wheel_colliders(&self) -> &[Collider] {
        &self.wheel_colliders
    }

    /// Wheel particle emitters, index-aligned with the solver wheels
    pub fn wheel_emitters(&self) -> &[ParticleEmitterComponent] {
        &self.wheel_emitters
    }

    /// Mutable wheel emitters, for sorting before drawing
    pub fn wheel_emitters_mut(&mut self) -> &mut [ParticleEmitterComponent] {
        &mut self.wheel_emitters
    }

    /// Ray-cast group excluded from this vehicle's own wheel casts
    pub fn raycast_group(&self) -> u32 {
        self.raycast_group
    }

    /// Constant force added to the chassis each step
    pub fn down_force(&self) -> Vec3 {
        self.descriptor.down_force
    }

    /// Digital or analog input interpretation
    pub fn input_mode(&self) -> InputMode {
        self.descriptor.input_mode
    }

    /// Input buffer waiting for the next step
    pub fn raw_input(&self) -> &VehicleRawInput {
        &self.raw_input
    }

    /// Controls handed to the solver in the last step
    pub fn controls(&self) -> DriveControls {
        self.controls
    }

    /// No wheel pushed on the ground in the last step
    pub fn is_in_air(&self) -> bool {
        self.in_air
    }

    /// Health, damage and boost state
    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    /// Current health
    pub fn health(&self) -> f32 {
        self.combat.health()
    }

    /// Health ceiling for healing
    pub fn max_health(&self) -> f32 {
        self.combat.max_health()
    }

    /// Damage taken per unit of incoming damage
    pub fn resistance(&self, ctx: &SimulationContext) -> f32 {
        self.combat.resistance(ctx.time)
    }

    /// Damage dealt on contact
    pub fn base_damage(&self, ctx: &SimulationContext) -> f32 {
        self.combat.base_damage(ctx.time)
    }

    /// Engine force multiplier from power-ups
    pub fn speed_multiplier(&self, ctx: &SimulationContext) -> f32 {
        self.combat.speed_multiplier(ctx.time)
    }

    /// Resistance multiplier from power-ups
    pub fn defence_multiplier(&self, ctx: &SimulationContext) -> f32 {
        self.combat.defence_multiplier(ctx.time)
    }

    /// Seconds since the last boost, `None` if never boosted
    pub fn time_since_boost(&self, ctx: &SimulationContext) -> Option<f64> {
        self.combat.time_since_boost(ctx.time)
    }

    /// Inspect chassis, combat state and wheels
    pub fn render_debug_gui(&mut self, ui: &mut dyn DebugUi, physics: &mut PhysicsWorld) {
        if ui.tree_node("Chassis") {
            let size = self.descriptor.chassis_size;
            ui.label("Size", &format!("[{:.2}, {:.2}, {:.2}]", size.x, size.y, size.z));
            ui.label("Mass", &format!("{:.1}", self.descriptor.chassis_mass));
            ui.label("Forward Speed", &format!("{:.2}", self.forward_speed(physics)));
            ui.label("In Air", &self.in_air.to_string());
            ui.edit_vec3("Down Force", &mut self.descriptor.down_force);
            ui.tree_pop();
        }

        if ui.tree_node("Combat") {
            let mut health = self.combat.health();
            if ui.edit_f32("Health", &mut health) {
                self.combat.set_health(health);
            }
            ui.label("Max Health", &format!("{:.1}", self.combat.max_health()));
            let power_up = match self.combat.power_up_life() {
                Some(life) => format!("until {:.1}s", life.seconds()),
                None => "none".to_string(),
            };
            ui.label("Power-Up", &power_up);
            ui.label("Boost Direction", &format!("{:?}", self.combat.boost_direction()));
            ui.tree_pop();
        }

        if ui.tree_node("Wheels") {
            ui.label("Wheel Count", &self.wheels.len().to_string());
            ui.label("Radius", &format!("{:.2}", self.descriptor.wheel_radius));
            let mut steer_angle = utils::rad_to_deg(self.descriptor.tuning.max_steer_angle);
            if ui.edit_f32("Max Steer Angle", &mut steer_angle) {
                self.descriptor.tuning.max_steer_angle = utils::deg_to_rad(steer_angle);
            }
            for (i, (collider, emitter)) in self.wheel_colliders.iter_mut().zip(&mut self.wheel_emitters).enumerate() {
                if ui.tree_node(&format!("Wheel {}", i)) {
                    collider.render_debug_gui(ui, physics);
                    emitter.render_debug_gui(ui);
                    ui.tree_pop();
                }
            }
            ui.tree_pop();
        }
    }

    fn raise(&self, event_type: EventType, ctx: &BodyContext<'_>) -> Event {
        Event::new(event_type, ctx.sim.time.seconds()).with_entity("vehicle", self.chassis.entity())
    }
}

impl std::fmt::Debug for VehicleComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleComponent")
            .field("chassis", &self.chassis.body_handle())
            .field("wheels", &self.wheels.len())
            .field("health", &self.combat.health())
            .field("in_air", &self.in_air)
            .finish()
    }
}

impl Damageable for VehicleComponent {
    fn take_damage(&mut self, damager: Option<Entity>, damage: f32, ctx: &mut BodyContext<'_>) -> DamageOutcome {
        let outcome = VehicleComponent::take_damage(self, damager, damage, ctx.sim);
        if outcome.applied > 0.0 {
            let event = self
                .raise(EventType::VehicleDamaged, ctx)
                .with_entity("damager", damager)
                .with_arg("amount", EventArg::Amount(outcome.applied));
            ctx.events.push(event);
        }
        if outcome.destroyed {
            let event = self.raise(EventType::VehicleDestroyed, ctx).with_entity("damager", damager);
            ctx.events.push(event);
        }
        outcome
    }

    fn health(&self) -> f32 {
        self.combat.health()
    }
}

impl PhysicsBody for VehicleComponent {
    fn body_handle(&self) -> Option<RigidBodyHandle> {
        self.chassis.body_handle()
    }

    fn entity(&self) -> Option<Entity> {
        self.chassis.entity()
    }

    fn update_from_physics(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        self.chassis.sync_transform(physics, scene);
        self.update_wheel_transforms(physics, scene);
    }

    fn on_contact(&mut self, other: &mut dyn PhysicsBody, ctx: &mut BodyContext<'_>) {
        let damage = self.combat.base_damage(ctx.sim.time);
        let attacker = self.chassis.entity();
        let Some(target) = other.as_damageable() else { return };

        target.take_damage(attacker, damage, ctx);
        for emitter in &mut self.wheel_emitters {
            let count = emitter.settings().emit_count;
            emitter.emit(count, ctx.scene);
        }
    }

    fn on_trigger(&mut self, other: &mut dyn PhysicsBody, ctx: &mut BodyContext<'_>) {
        let Some(power_up) = other.consume_power_up() else { return };

        self.apply_power_up(power_up, ctx.sim);
        let event = self
            .raise(EventType::PowerUpCollected, ctx)
            .with_arg("power_up", EventArg::PowerUp(power_up.kind))
            .with_arg("amount", EventArg::Amount(power_up.value));
        ctx.events.push(event);
    }

    fn as_damageable(&mut self) -> Option<&mut dyn Damageable> {
        Some(self)
    }
}

impl Component for VehicleComponent {
    fn component_type(&self) -> ComponentType {
        ComponentType::Vehicle
    }

    fn set_entity(&mut self, entity: Entity, world: &mut World, _ctx: &SimulationContext) {
        match world.transform_key(entity) {
            Some(key) => self.chassis.bind(Some(entity), key),
            None => log::warn!("Vehicle attached to unknown entity {:?}", entity),
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if event.event_type == EventType::VehicleDestroyed
            && event.get_entity("vehicle").is_some()
            && event.get_entity("vehicle") == self.chassis.entity()
        {
            self.raw_input.clear();
            self.smoother.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{RecordingUi, ScriptedEdit};
    use crate::ecs::components::power_up::PowerUpComponent;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    struct Arena {
        physics: PhysicsWorld,
        scene: SceneGraph,
        assets: VehicleAssets,
        _ground: RigidDynamicComponent,
    }

    fn arena() -> Arena {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let assets = VehicleAssets::headless(&physics);

        let floor = Collider::new(
            "Ground",
            physics.materials().get("Asphalt"),
            QueryFilterType::DrivableSurface.filter_data(),
            ColliderGeometry::cuboid(Vec3::new(200.0, 1.0, 200.0)),
        );
        let mut ground = RigidDynamicComponent::new_static().with_collider(floor);
        let key = scene.insert(Transform::from_position(Vec3::new(0.0, -0.5, 0.0)));
        ground.create_actor(&mut physics, &scene, key).unwrap();

        Arena {
            physics,
            scene,
            assets,
            _ground: ground,
        }
    }

    fn spawn(arena: &mut Arena, position: Vec3) -> VehicleComponent {
        let mut vehicle = VehicleComponent::new(4, true, &arena.assets).unwrap();
        let key = arena.scene.insert(Transform::from_position(position));
        vehicle.create_vehicle(&mut arena.physics, &mut arena.scene, key).unwrap();
        arena.physics.update_query_pipeline();
        vehicle
    }

    fn run(arena: &mut Arena, vehicle: &mut VehicleComponent, ctx: &mut SimulationContext, steps: usize) {
        for _ in 0..steps {
            vehicle.update_controls(&mut arena.physics, ctx);
            arena.physics.step(ctx.delta);
            vehicle.update_from_physics(&mut arena.physics, &mut arena.scene);
            ctx.advance();
        }
    }

    #[test]
    fn test_default_layout() {
        let physics = PhysicsWorld::default();
        let vehicle = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();

        assert_eq!(vehicle.wheel_count(), 4);
        assert_eq!(vehicle.axle_data(), &[AxleData::new(1.5, 0.9), AxleData::new(-1.5, 0.9)]);
        assert_eq!(vehicle.wheel_meshes().len(), 4);
        assert_eq!(vehicle.wheel_colliders().len(), 4);
        assert_eq!(vehicle.wheel_emitters().len(), 4);
        assert_eq!(vehicle.input_mode(), InputMode::Digital);
        assert_relative_eq!(vehicle.wheel_moment_of_inertia(), 2.5);
    }

    #[test]
    fn test_config_values_are_reproduced() {
        let physics = PhysicsWorld::default();
        let doc = ConfigDocument::new()
            .with("WheelCount", 4)
            .with_list(
                "AxleData",
                vec![
                    ConfigDocument::new().with("CenterOffset", 1.8).with("WheelInset", 1.0),
                    ConfigDocument::new().with("CenterOffset", -1.6).with("WheelInset", 1.1),
                ],
            )
            .with_vec3("ChassisSize", Vec3::new(2.8, 1.2, 5.5))
            .with("ChassisMass", 2000.0)
            .with("WheelMass", 25.0)
            .with("WheelRadius", 0.55)
            .with("WheelWidth", 0.45)
            .with("Health", 800.0)
            .with("MaxHealth", 1200.0)
            .with("Resistance", 0.4)
            .with("BaseDamage", 3.0)
            .with("InputTypeDigital", false);

        let vehicle = VehicleComponent::from_config(&doc, &VehicleAssets::headless(&physics)).unwrap();
        let ctx = SimulationContext::default();

        assert_eq!(vehicle.chassis_mass(), 2000.0);
        assert_eq!(vehicle.chassis_size(), Vec3::new(2.8, 1.2, 5.5));
        assert_eq!(vehicle.wheel_mass(), 25.0);
        assert_eq!(vehicle.wheel_radius(), 0.55);
        assert_eq!(vehicle.wheel_width(), 0.45);
        assert_eq!(vehicle.axle_data(), &[AxleData::new(1.8, 1.0), AxleData::new(-1.6, 1.1)]);
        assert_eq!(vehicle.health(), 800.0);
        assert_eq!(vehicle.max_health(), 1200.0);
        assert_eq!(vehicle.resistance(&ctx), 0.4);
        assert_eq!(vehicle.base_damage(&ctx), 3.0);
        assert_eq!(vehicle.input_mode(), InputMode::Analog);
    }

    #[test]
    fn test_odd_wheel_count_gets_extra_axle() {
        let physics = PhysicsWorld::default();
        let vehicle = VehicleComponent::new(5, true, &VehicleAssets::headless(&physics)).unwrap();

        assert_eq!(vehicle.wheel_count(), 6);
        assert_eq!(vehicle.axle_data().len(), 3);
        assert_eq!(vehicle.wheel_emitters().len(), 6);
        assert!(vehicle.wheels()[0].steered && vehicle.wheels()[1].steered);
        assert!(vehicle.wheels()[2..].iter().all(|wheel| !wheel.steered && wheel.handbraked));
    }

    #[test]
    fn test_take_damage_scales_by_resistance() {
        let physics = PhysicsWorld::default();
        let mut vehicle = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();
        let ctx = SimulationContext::default();

        vehicle.take_damage(None, 200.0, &ctx);
        assert_relative_eq!(vehicle.health(), 900.0);

        let outcome = vehicle.take_damage(None, 5000.0, &ctx);
        assert_eq!(vehicle.health(), 0.0);
        assert!(outcome.destroyed);
        assert_relative_eq!(outcome.applied, 900.0);
    }

    #[test]
    fn test_create_vehicle_builds_rig() {
        let mut arena = arena();
        let bodies_before = arena.physics.body_count();
        let vehicle = spawn(&mut arena, Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(arena.physics.body_count(), bodies_before + 1);
        let body = arena.physics.body(vehicle.body_handle().unwrap()).unwrap();
        assert_relative_eq!(body.mass(), 1500.0, epsilon = 1e-2);
        assert_eq!(body.colliders().len(), 5);
        assert!(vehicle.wheel_colliders().iter().all(|collider| collider.shape().is_some()));
        assert!(vehicle.wheel_meshes().iter().all(|mesh| mesh.transform_key().is_some()));
        assert_eq!(vehicle.wheel_poses()[1].position, Vec3::new(-0.9, -0.5, 1.5));
    }

    #[test]
    fn test_failed_rig_leaves_nothing_behind() {
        let mut arena = arena();
        let bodies = arena.physics.body_count();
        let colliders = arena.physics.collider_count();
        let doc = ConfigDocument::new().with_vec3("ChassisSize", Vec3::new(0.0, 1.0, 5.0));
        let mut vehicle = VehicleComponent::from_config(&doc, &arena.assets).unwrap();
        let key = arena.scene.insert(Transform::identity());

        let result = vehicle.create_vehicle(&mut arena.physics, &mut arena.scene, key);

        assert!(matches!(result, Err(VehicleError::Physics(PhysicsError::InvalidGeometry(_)))));
        assert_eq!(arena.physics.body_count(), bodies);
        assert_eq!(arena.physics.collider_count(), colliders);
        assert!(vehicle.body_handle().is_none());
    }

    #[test]
    fn test_second_boost_within_cooldown_is_ignored() {
        let mut arena = arena();
        let mut vehicle = spawn(&mut arena, Vec3::new(0.0, 1.0, 0.0));
        let handle = vehicle.body_handle().unwrap();

        let first = vehicle.boost(Vec3::new(0.0, 0.0, 2.0), &mut arena.physics, &arena.scene, &SimulationContext::default());
        assert!(first);
        assert_relative_eq!(arena.physics.body(handle).unwrap().linvel().z, 8.0, epsilon = 1e-3);
        assert!(vehicle.wheel_emitters().iter().all(|emitter| emitter.particle_count() > 0));

        arena.physics.body_mut(handle).unwrap().set_linvel(Vec3::zeros(), true);
        let ctx = SimulationContext::default().at(1.0);
        let second = vehicle.boost(Vec3::z(), &mut arena.physics, &arena.scene, &ctx);

        assert!(!second);
        assert_eq!(*arena.physics.body(handle).unwrap().linvel(), Vec3::zeros());
        assert_eq!(vehicle.combat().last_boost(), Some(SimulationContext::default().time));
        assert_relative_eq!(vehicle.time_since_boost(&ctx).unwrap(), 1.0);

        let later = SimulationContext::default().at(3.0);
        assert!(vehicle.boost(Vec3::z(), &mut arena.physics, &arena.scene, &later));
    }

    #[test]
    fn test_wheel_transforms_follow_solver() {
        let mut arena = arena();
        let mut vehicle = spawn(&mut arena, Vec3::new(0.0, 1.0, 0.0));
        let mut ctx = SimulationContext::new(DT);

        vehicle.steer(1.0);
        vehicle.handle_acceleration(1.0, 0.0);
        run(&mut arena, &mut vehicle, &mut ctx, 30);

        assert!(vehicle.controls().steer > 0.0);
        for i in 0..vehicle.wheel_count() {
            let pose = vehicle.wheel_pose(i).unwrap();
            let mesh = &vehicle.wheel_meshes()[i];
            let collider = &vehicle.wheel_colliders()[i];
            let emitter = &vehicle.wheel_emitters()[i];

            assert_eq!(mesh.local_transform(), pose);
            assert_eq!(arena.scene.local(mesh.transform_key().unwrap()), Some(&pose));
            assert_eq!(collider.local_transform(), pose);
            assert_eq!(emitter.local_transform(), pose);
            assert_eq!(arena.scene.local(emitter.transform_key().unwrap()), Some(&pose));

            let shape = arena.physics.collider(collider.shape().unwrap()).unwrap();
            let shape_pose = shape.position_wrt_parent().unwrap();
            assert_relative_eq!(shape_pose.translation.vector, pose.position, epsilon = 1e-5);
        }
        // steered and spinning wheels carry a rotation the emitters share
        let front = vehicle.wheel_pose(0).unwrap();
        assert_ne!(front.rotation, Quat::identity());
        assert_eq!(vehicle.wheel_emitters()[0].local_transform().rotation, front.rotation);

        // wheels stay under the chassis on their own side
        let poses = vehicle.wheel_poses();
        assert!(poses[0].position.x > 0.0 && poses[1].position.x < 0.0);
        assert!(poses.iter().all(|pose| pose.position.y < 0.0));
    }

    #[test]
    fn test_vehicle_settles_and_drives_forward() {
        let mut arena = arena();
        let mut vehicle = spawn(&mut arena, Vec3::new(0.0, 1.0, 0.0));
        let mut ctx = SimulationContext::new(DT);

        run(&mut arena, &mut vehicle, &mut ctx, 120);
        assert!(!vehicle.is_in_air());
        let height = arena.physics.body_pose(vehicle.body_handle().unwrap()).unwrap().translation.y;
        assert!(height > 0.4 && height < 1.5, "chassis settled at {}", height);

        vehicle.handle_acceleration(1.0, 0.0);
        run(&mut arena, &mut vehicle, &mut ctx, 60);

        assert!(vehicle.forward_speed(&arena.physics) > 1.0);
        let z = arena.physics.body_pose(vehicle.body_handle().unwrap()).unwrap().translation.z;
        assert!(z > 0.5);
    }

    #[test]
    fn test_contact_damages_damageable_body() {
        let physics = PhysicsWorld::default();
        let assets = VehicleAssets::headless(&physics);
        let mut rammer = VehicleComponent::new(4, true, &assets).unwrap();
        let mut target = VehicleComponent::new(4, true, &assets).unwrap();
        let scene = SceneGraph::new();
        let sim = SimulationContext::default();
        let mut events = Vec::new();
        let mut ctx = BodyContext { sim: &sim, scene: &scene, events: &mut events };

        rammer.on_contact(&mut target, &mut ctx);

        assert_relative_eq!(target.health(), 999.5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::VehicleDamaged);
        assert_eq!(events[0].get_amount(), Some(0.5));
        assert!(rammer.wheel_emitters().iter().all(|emitter| emitter.particle_count() > 0));
    }

    #[test]
    fn test_contact_with_plain_body_does_nothing() {
        let physics = PhysicsWorld::default();
        let mut rammer = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();
        let mut wall = RigidDynamicComponent::new_static();
        let scene = SceneGraph::new();
        let sim = SimulationContext::default();
        let mut events = Vec::new();
        let mut ctx = BodyContext { sim: &sim, scene: &scene, events: &mut events };

        rammer.on_contact(&mut wall, &mut ctx);

        assert!(events.is_empty());
        assert!(rammer.wheel_emitters().iter().all(|emitter| emitter.particle_count() == 0));
    }

    #[test]
    fn test_trigger_collects_power_up_once() {
        let physics = PhysicsWorld::default();
        let mut vehicle = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();
        let mut pickup = PowerUpComponent::new(PowerUp::new(PowerUpKind::Speed), 1.0, &physics);
        let scene = SceneGraph::new();
        let sim = SimulationContext::default().at(4.0);
        let mut events = Vec::new();

        let mut ctx = BodyContext { sim: &sim, scene: &scene, events: &mut events };
        vehicle.on_trigger(&mut pickup, &mut ctx);
        vehicle.on_trigger(&mut pickup, &mut ctx);

        assert_relative_eq!(vehicle.speed_multiplier(&sim), 1.5);
        assert!(pickup.is_consumed());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get_power_up(), Some(PowerUpKind::Speed));

        let expired = SimulationContext::default().at(4.0 + POWER_UP_DURATION);
        assert_relative_eq!(vehicle.speed_multiplier(&expired), 1.0);
    }

    #[test]
    fn test_destruction_is_reported_once() {
        let physics = PhysicsWorld::default();
        let mut vehicle = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();
        let scene = SceneGraph::new();
        let sim = SimulationContext::default();
        let mut events = Vec::new();
        let mut ctx = BodyContext { sim: &sim, scene: &scene, events: &mut events };

        Damageable::take_damage(&mut vehicle, None, 4000.0, &mut ctx);
        Damageable::take_damage(&mut vehicle, None, 4000.0, &mut ctx);

        let destroyed = events.iter().filter(|e| e.event_type == EventType::VehicleDestroyed).count();
        assert_eq!(destroyed, 1);
        assert_eq!(Damageable::health(&vehicle), 0.0);
    }

    #[test]
    fn test_debug_gui_edits_health() {
        let mut physics = PhysicsWorld::default();
        let mut vehicle = VehicleComponent::new(4, true, &VehicleAssets::headless(&physics)).unwrap();
        let mut ui = RecordingUi::new().with_edit("Health", ScriptedEdit::F32(450.0));

        vehicle.render_debug_gui(&mut ui, &mut physics);

        assert_eq!(vehicle.health(), 450.0);
        assert!(ui.contains("Wheel Count: 4"));
        assert!(ui.contains("> Wheel 3"));
    }
}
