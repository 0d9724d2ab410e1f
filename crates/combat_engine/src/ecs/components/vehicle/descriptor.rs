//! Vehicle construction parameters
//!
//! Everything a vehicle is built from, read from a content document with a
//! default for every key. Nothing in here touches the physics world.

use rapier3d::control::WheelTuning;

use super::input::InputMode;
use crate::config::ConfigDocument;
use crate::ecs::components::particle_emitter::EmitterSettings;
use crate::foundation::math::{utils, Vec3};

/// Longitudinal placement and half-track of one axle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxleData {
    center_offset: f32,
    wheel_inset: f32,
}

impl AxleData {
    /// Axle `center_offset` along the chassis (+Z is the front) with wheels `wheel_inset` either side
    pub const fn new(center_offset: f32, wheel_inset: f32) -> Self {
        Self {
            center_offset,
            wheel_inset,
        }
    }

    /// Offset along the chassis length
    pub fn center_offset(&self) -> f32 {
        self.center_offset
    }

    /// Lateral offset of each wheel
    pub fn wheel_inset(&self) -> f32 {
        self.wheel_inset
    }

    fn from_config(doc: &ConfigDocument) -> Self {
        Self::new(doc.get_or("CenterOffset", 0.0), doc.get_or("WheelInset", 0.0))
    }
}

/// Axles used when a document names none
pub const DEFAULT_AXLES: [AxleData; 2] = [AxleData::new(1.5, 0.9), AxleData::new(-1.5, 0.9)];

/// Front wheel lock angle used when a document names none (degrees)
pub const DEFAULT_MAX_STEER_DEGREES: f32 = 35.0;

/// Drive, brake, steering and suspension limits
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleTuning {
    /// Total engine force at full throttle (N), shared by all wheels
    pub max_engine_force: f32,
    /// Brake force per wheel at full brake (N)
    pub max_brake_force: f32,
    /// Extra brake force on the rear axles at full handbrake (N)
    pub max_handbrake_force: f32,
    /// Front wheel lock angle (radians)
    pub max_steer_angle: f32,
    /// Suspension length at rest (m)
    pub suspension_rest_length: f32,
    /// Spring stiffness per unit chassis mass
    pub suspension_stiffness: f32,
    /// Damping while compressing
    pub suspension_compression: f32,
    /// Damping while extending
    pub suspension_damping: f32,
    /// Travel either side of the rest length (m)
    pub max_suspension_travel: f32,
    /// Spring force cap (N)
    pub max_suspension_force: f32,
    /// Tyre grip
    pub friction_slip: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            max_engine_force: 12_000.0,
            max_brake_force: 3_000.0,
            max_handbrake_force: 6_000.0,
            max_steer_angle: utils::deg_to_rad(DEFAULT_MAX_STEER_DEGREES),
            suspension_rest_length: 0.3,
            suspension_stiffness: 20.0,
            suspension_compression: 4.4,
            suspension_damping: 2.3,
            max_suspension_travel: 0.25,
            max_suspension_force: 100_000.0,
            friction_slip: 10.5,
        }
    }
}

impl VehicleTuning {
    /// Read a `Tuning` document; the steer angle is given in degrees
    pub fn from_config(doc: &ConfigDocument) -> Self {
        let d = Self::default();
        Self {
            max_engine_force: doc.get_or("MaxEngineForce", d.max_engine_force),
            max_brake_force: doc.get_or("MaxBrakeForce", d.max_brake_force),
            max_handbrake_force: doc.get_or("MaxHandbrakeForce", d.max_handbrake_force),
            max_steer_angle: utils::deg_to_rad(doc.get_or("MaxSteerAngle", DEFAULT_MAX_STEER_DEGREES)),
            suspension_rest_length: doc.get_or("SuspensionRestLength", d.suspension_rest_length),
            suspension_stiffness: doc.get_or("SuspensionStiffness", d.suspension_stiffness),
            suspension_compression: doc.get_or("SuspensionCompression", d.suspension_compression),
            suspension_damping: doc.get_or("SuspensionDamping", d.suspension_damping),
            max_suspension_travel: doc.get_or("MaxSuspensionTravel", d.max_suspension_travel),
            max_suspension_force: doc.get_or("MaxSuspensionForce", d.max_suspension_force),
            friction_slip: doc.get_or("FrictionSlip", d.friction_slip),
        }
    }

    /// Per-wheel solver tuning
    pub fn wheel_tuning(&self) -> WheelTuning {
        WheelTuning {
            suspension_stiffness: self.suspension_stiffness,
            suspension_compression: self.suspension_compression,
            suspension_damping: self.suspension_damping,
            max_suspension_travel: self.max_suspension_travel,
            friction_slip: self.friction_slip,
            max_suspension_force: self.max_suspension_force,
        }
    }
}

/// Complete description of a vehicle before it is built
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDescriptor {
    /// Number of wheels
    pub wheel_count: usize,
    /// Axles front to back
    pub axles: Vec<AxleData>,
    /// Chassis box size (width, height, length)
    pub chassis_size: Vec3,
    /// Chassis mass (kg)
    pub chassis_mass: f32,
    /// Mass of one wheel (kg)
    pub wheel_mass: f32,
    /// Wheel radius (m)
    pub wheel_radius: f32,
    /// Wheel width (m)
    pub wheel_width: f32,
    /// Starting health
    pub health: f32,
    /// Health ceiling
    pub max_health: f32,
    /// Fraction of incoming damage taken
    pub resistance: f32,
    /// Damage dealt on contact
    pub base_damage: f32,
    /// Velocity change of a boost (m/s)
    pub boost_power: f32,
    /// Seconds between boosts
    pub boost_cooldown: f64,
    /// How raw input is interpreted
    pub input_mode: InputMode,
    /// Collision group of the chassis
    pub collision_group: String,
    /// Constant force applied to the chassis every step
    pub down_force: Vec3,
    /// Driving limits
    pub tuning: VehicleTuning,
    /// Settings for the per-wheel dust/boost emitters
    pub wheel_emitter: EmitterSettings,
}

impl Default for VehicleDescriptor {
    fn default() -> Self {
        Self {
            wheel_count: 4,
            axles: DEFAULT_AXLES.to_vec(),
            chassis_size: Vec3::new(2.5, 1.0, 5.0),
            chassis_mass: 1500.0,
            wheel_mass: 20.0,
            wheel_radius: 0.5,
            wheel_width: 0.4,
            health: 1000.0,
            max_health: 1000.0,
            resistance: 0.5,
            base_damage: 1.0,
            boost_power: 8.0,
            boost_cooldown: 3.0,
            input_mode: InputMode::Digital,
            collision_group: "Vehicles".to_string(),
            down_force: Vec3::zeros(),
            tuning: VehicleTuning::default(),
            wheel_emitter: default_wheel_emitter(),
        }
    }
}

fn default_wheel_emitter() -> EmitterSettings {
    EmitterSettings {
        emit_count: 8,
        emit_cone_min_angle: utils::deg_to_rad(60.0),
        emit_cone_max_angle: utils::deg_to_rad(120.0),
        emit_scale: Vec3::new(0.2, 0.1, 0.2),
        initial_speed: 3.0,
        acceleration: Vec3::new(0.0, -2.0, 0.0),
        lifetime: 0.6,
        spawn_rate: 0.0,
        texture: "Particles/Dust.png".to_string(),
        ..EmitterSettings::default()
    }
}

impl VehicleDescriptor {
    /// Read a vehicle document. Missing or malformed keys use defaults.
    pub fn from_config(doc: &ConfigDocument) -> Self {
        let d = Self::default();

        let axles = if doc.contains("AxleData") {
            doc.list("AxleData").iter().map(AxleData::from_config).collect()
        } else {
            d.axles
        };
        let health = doc.get_or("Health", d.health);
        let input_mode = if doc.get_or("InputTypeDigital", true) {
            InputMode::Digital
        } else {
            InputMode::Analog
        };
        let wheel_emitter = if doc.contains("WheelEmitter") {
            EmitterSettings::from_config(&doc.child("WheelEmitter"))
        } else {
            d.wheel_emitter
        };

        Self {
            wheel_count: doc.get_or("WheelCount", d.wheel_count),
            axles,
            chassis_size: doc.vec3_or("ChassisSize", d.chassis_size),
            chassis_mass: doc.get_or("ChassisMass", d.chassis_mass),
            wheel_mass: doc.get_or("WheelMass", d.wheel_mass),
            wheel_radius: doc.get_or("WheelRadius", d.wheel_radius),
            wheel_width: doc.get_or("WheelWidth", d.wheel_width),
            health,
            max_health: doc.get_or("MaxHealth", health),
            resistance: doc.get_or("Resistance", d.resistance),
            base_damage: doc.get_or("BaseDamage", d.base_damage),
            boost_power: doc.get_or("BoostPower", d.boost_power),
            boost_cooldown: doc.get_or("BoostCooldown", d.boost_cooldown),
            input_mode,
            collision_group: doc.str_or("CollisionGroup", &d.collision_group),
            down_force: doc.vec3_or("DownForce", d.down_force),
            tuning: VehicleTuning::from_config(&doc.child("Tuning")),
            wheel_emitter,
        }
    }

    /// Chassis moment of inertia about its principal axes
    pub fn chassis_moment_of_inertia(&self) -> Vec3 {
        let (x, y, z) = (self.chassis_size.x, self.chassis_size.y, self.chassis_size.z);
        let m = self.chassis_mass;
        Vec3::new(
            (y * y + z * z) * m / 12.0,
            (x * x + z * z) * 0.8 * m / 12.0,
            (x * x + y * y) * m / 12.0,
        )
    }

    /// Centre of mass relative to the chassis origin, low and slightly forward
    pub fn chassis_center_of_mass_offset(&self) -> Vec3 {
        Vec3::new(0.0, -self.chassis_size.y * 0.5 + 0.65, 0.25)
    }

    /// Moment of inertia of one wheel about its axle
    pub fn wheel_moment_of_inertia(&self) -> f32 {
        0.5 * self.wheel_mass * self.wheel_radius * self.wheel_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let descriptor = VehicleDescriptor::from_config(&ConfigDocument::new());

        assert_eq!(descriptor, VehicleDescriptor::default());
        assert_eq!(descriptor.wheel_count, 4);
        assert_eq!(descriptor.axles, DEFAULT_AXLES.to_vec());
        assert_eq!(descriptor.input_mode, InputMode::Digital);
        assert_eq!(descriptor.collision_group, "Vehicles");
    }

    #[test]
    fn test_empty_tuning_matches_default_exactly() {
        let tuning = VehicleTuning::from_config(&ConfigDocument::new());

        assert_eq!(tuning, VehicleTuning::default());
        assert_eq!(tuning.max_steer_angle, utils::deg_to_rad(DEFAULT_MAX_STEER_DEGREES));
    }

    #[test]
    fn test_config_values_are_read() {
        let doc = ConfigDocument::new()
            .with("WheelCount", 6)
            .with_list(
                "AxleData",
                vec![
                    ConfigDocument::new().with("CenterOffset", 2.0).with("WheelInset", 1.0),
                    ConfigDocument::new().with("CenterOffset", 0.0).with("WheelInset", 1.0),
                    ConfigDocument::new().with("CenterOffset", -2.0).with("WheelInset", 1.1),
                ],
            )
            .with_vec3("ChassisSize", Vec3::new(3.0, 1.5, 7.0))
            .with("ChassisMass", 4000.0)
            .with("Health", 1500.0)
            .with("Resistance", 0.25)
            .with("BoostCooldown", 5.0)
            .with("InputTypeDigital", false)
            .with_child("Tuning", ConfigDocument::new().with("MaxSteerAngle", 20.0))
            .with_child("WheelEmitter", ConfigDocument::new().with("EmitCount", 3));

        let descriptor = VehicleDescriptor::from_config(&doc);

        assert_eq!(descriptor.wheel_count, 6);
        assert_eq!(descriptor.axles[2], AxleData::new(-2.0, 1.1));
        assert_eq!(descriptor.chassis_size, Vec3::new(3.0, 1.5, 7.0));
        assert_eq!(descriptor.chassis_mass, 4000.0);
        assert_eq!(descriptor.max_health, 1500.0);
        assert_eq!(descriptor.resistance, 0.25);
        assert_eq!(descriptor.boost_cooldown, 5.0);
        assert_eq!(descriptor.input_mode, InputMode::Analog);
        assert_relative_eq!(descriptor.tuning.max_steer_angle, utils::deg_to_rad(20.0));
        assert_eq!(descriptor.tuning.max_engine_force, VehicleTuning::default().max_engine_force);
        assert_eq!(descriptor.wheel_emitter.emit_count, 3);
    }

    #[test]
    fn test_mass_properties() {
        let descriptor = VehicleDescriptor::default();
        let moi = descriptor.chassis_moment_of_inertia();

        assert_relative_eq!(moi.x, (1.0 + 25.0) * 1500.0 / 12.0);
        assert_relative_eq!(moi.y, (6.25 + 25.0) * 0.8 * 1500.0 / 12.0);
        assert_relative_eq!(moi.z, (6.25 + 1.0) * 1500.0 / 12.0);
        assert_relative_eq!(descriptor.chassis_center_of_mass_offset(), Vec3::new(0.0, 0.15, 0.25), epsilon = 1e-6);
        assert_relative_eq!(descriptor.wheel_moment_of_inertia(), 2.5);
    }
}
