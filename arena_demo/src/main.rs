//! Arena demo application
//!
//! Runs a short headless match: an attacker drives through a damage
//! power-up, boosts and rams a parked opponent. Gameplay events are logged
//! as they happen and a summary is printed at the end.
//!
//! Usage: `arena_demo [config.toml|config.ron]`

use std::cell::RefCell;
use std::rc::Rc;

use combat_engine::debug::RecordingUi;
use combat_engine::ecs::components::{Collider, PowerUp, PowerUpComponent, PowerUpKind, RigidDynamicComponent};
use combat_engine::events::{EventHandler, EventSystem};
use combat_engine::foundation::logging;
use combat_engine::physics::{ColliderGeometry, QueryFilterType};
use combat_engine::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Vehicle content shared by both contestants
const VEHICLE_DOCUMENT: &str = r#"
WheelCount = 4
ChassisSize = [2.5, 1.0, 5.0]
ChassisMass = 1500.0
Health = 1000.0
Resistance = 0.5
BaseDamage = 120.0
BoostPower = 10.0
BoostCooldown = 2.0

[[AxleData]]
CenterOffset = 1.5
WheelInset = 0.9

[[AxleData]]
CenterOffset = -1.5
WheelInset = 0.9

[Tuning]
MaxEngineForce = 14000.0
MaxSteerAngle = 30.0
"#;

/// Frames of 1/60 s the match lasts
const MATCH_FRAMES: u32 = 60 * 12;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] combat_engine::config::ConfigError),

    #[error(transparent)]
    Physics(#[from] combat_engine::physics::PhysicsError),

    #[error(transparent)]
    Vehicle(#[from] VehicleError),
}

#[derive(Debug, Default)]
struct MatchStats {
    hits: u32,
    damage_dealt: f32,
    boosts: u32,
    power_ups: u32,
    destroyed: bool,
}

/// Tallies match events; registered once per event type
struct StatsHandler {
    stats: Rc<RefCell<MatchStats>>,
}

impl EventHandler for StatsHandler {
    fn on_event(&mut self, event: &Event) -> bool {
        let mut stats = self.stats.borrow_mut();
        match event.event_type {
            EventType::VehicleDamaged => {
                let amount = event.get_amount().unwrap_or(0.0);
                stats.hits += 1;
                stats.damage_dealt += amount;
                log::info!("[{:6.2}s] hit for {:.1}", event.timestamp, amount);
            }
            EventType::VehicleDestroyed => {
                stats.destroyed = true;
                log::info!("[{:6.2}s] vehicle destroyed", event.timestamp);
            }
            EventType::BoostFired => {
                stats.boosts += 1;
                log::debug!("[{:6.2}s] boost {:?}", event.timestamp, event.get_direction());
            }
            EventType::PowerUpCollected => {
                stats.power_ups += 1;
                log::info!("[{:6.2}s] collected {:?}", event.timestamp, event.get_power_up());
            }
        }
        true
    }
}

struct ArenaDemo {
    engine: Engine,
    attacker: BodyKey,
    target: BodyKey,
    rng: SmallRng,
    events: EventSystem,
    stats: Rc<RefCell<MatchStats>>,
}

impl ArenaDemo {
    fn new(mut engine: Engine) -> Result<Self, DemoError> {
        let simulation = engine.simulation_mut();
        let assets = VehicleAssets::headless(simulation.physics());
        let document = ConfigDocument::from_toml_str(VEHICLE_DOCUMENT)?;

        log::info!("Building arena...");
        let floor = Collider::new(
            "Ground",
            simulation.physics().materials().get("Asphalt"),
            QueryFilterType::DrivableSurface.filter_data(),
            ColliderGeometry::cuboid(Vec3::new(200.0, 1.0, 200.0)),
        );
        simulation.spawn_rigid(
            RigidDynamicComponent::new_static().with_collider(floor),
            Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        )?;

        let pickup = PowerUpComponent::new(PowerUp::new(PowerUpKind::Damage), 1.5, simulation.physics());
        simulation.spawn_power_up(pickup, Transform::from_position(Vec3::new(0.0, 1.0, -10.0)))?;

        let attacker = simulation.spawn_vehicle(
            VehicleComponent::from_config(&document, &assets)?,
            Transform::from_position(Vec3::new(0.0, 1.0, -25.0)),
        )?;
        let facing_attacker = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::PI);
        let target = simulation.spawn_vehicle(
            VehicleComponent::from_config(&document, &assets)?,
            Transform::from_position_rotation(Vec3::new(0.0, 1.0, 15.0), facing_attacker),
        )?;
        log::info!("Arena ready with {} bodies", simulation.body_count());

        let stats = Rc::new(RefCell::new(MatchStats::default()));
        let mut events = EventSystem::new();
        for event_type in [
            EventType::VehicleDamaged,
            EventType::VehicleDestroyed,
            EventType::BoostFired,
            EventType::PowerUpCollected,
        ] {
            events.register_handler(event_type, Box::new(StatsHandler { stats: Rc::clone(&stats) }));
        }

        Ok(Self {
            engine,
            attacker,
            target,
            rng: SmallRng::seed_from_u64(7),
            events,
            stats,
        })
    }

    fn run(&mut self) {
        log::info!("Match started");
        for frame in 0..MATCH_FRAMES {
            self.drive(frame);
            self.engine.update(1.0 / 60.0);
            self.events.send_all(self.engine.simulation_mut().drain_events());
            self.events.dispatch();
            if self.stats.borrow().destroyed {
                log::info!("Target destroyed after {} frames", frame + 1);
                break;
            }
        }
    }

    /// Scripted attacker input with a little steering noise
    fn drive(&mut self, frame: u32) {
        let jitter: f32 = self.rng.gen_range(-0.1..0.1);
        let simulation = self.engine.simulation_mut();
        if let Some(attacker) = simulation.vehicle_mut(self.attacker) {
            attacker.handle_acceleration(1.0, 0.0);
            attacker.steer(jitter);
        }
        // boost once up to speed, then whenever the cooldown allows
        if frame >= 90 && frame % 30 == 0 {
            simulation.boost(self.attacker, Vec3::zeros());
        }
        if let Some(target) = simulation.vehicle_mut(self.target) {
            target.handbrake(1.0);
        }
    }

    fn report(&mut self) {
        let simulation = self.engine.simulation_mut();
        let ctx = simulation.context().clone();
        if let Some(target) = simulation.vehicle(self.target) {
            log::info!("Target health {:.1} / {:.1}", target.health(), target.max_health());
        }
        if let Some(attacker) = simulation.vehicle(self.attacker) {
            log::info!(
                "Attacker speed {:.1} m/s, base damage {:.1}",
                attacker.forward_speed(simulation.physics()),
                attacker.base_damage(&ctx)
            );
        }

        let mut ui = RecordingUi::new();
        simulation.render_debug_gui(&mut ui);
        for line in ui.lines() {
            log::debug!("{}", line);
        }

        let stats = self.stats.borrow();
        println!(
            "match over at {:.2}s: {} hits, {:.1} damage, {} boosts, {} power-ups, target destroyed: {}",
            ctx.time.seconds(),
            stats.hits,
            stats.damage_dealt,
            stats.boosts,
            stats.power_ups,
            stats.destroyed
        );
    }
}

fn main() -> Result<(), DemoError> {
    let engine = match std::env::args().nth(1) {
        Some(path) => Engine::from_file(path)?,
        None => Engine::new(SimulationConfig::default())?,
    };

    logging::init_with_default_filter(&engine.config().log_level);
    log::info!("Starting arena demo");

    let mut demo = ArenaDemo::new(engine)?;
    demo.run();
    demo.report();

    log::info!("Arena demo finished");
    Ok(())
}
