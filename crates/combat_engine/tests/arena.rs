//! End-to-end matches driven through the public engine API

use approx::assert_relative_eq;
use combat_engine::config::Config;
use combat_engine::foundation::logging;
use combat_engine::prelude::*;

fn ground() -> RigidDynamicComponent {
    let physics = PhysicsWorld::new(&SimulationConfig::default());
    let floor = Collider::new(
        "Ground",
        physics.materials().get("Asphalt"),
        QueryFilterType::DrivableSurface.filter_data(),
        ColliderGeometry::cuboid(Vec3::new(100.0, 1.0, 100.0)),
    );
    RigidDynamicComponent::new_static().with_collider(floor)
}

fn engine_with_arena() -> Engine {
    logging::init_for_tests();
    let mut engine = Engine::new(SimulationConfig::default()).unwrap();
    engine
        .simulation_mut()
        .spawn_rigid(ground(), Transform::from_position(Vec3::new(0.0, -0.5, 0.0)))
        .unwrap();
    engine
}

fn spawn_vehicle(engine: &mut Engine, position: Vec3) -> BodyKey {
    let simulation = engine.simulation_mut();
    let assets = VehicleAssets::headless(simulation.physics());
    let vehicle = VehicleComponent::new(4, true, &assets).unwrap();
    simulation.spawn_vehicle(vehicle, Transform::from_position(position)).unwrap()
}

#[test]
fn boosted_vehicle_damages_the_one_it_rams() {
    let mut engine = engine_with_arena();
    let attacker = spawn_vehicle(&mut engine, Vec3::new(0.0, 1.0, -6.0));
    let target = spawn_vehicle(&mut engine, Vec3::new(0.0, 1.0, 0.0));

    for _ in 0..30 {
        engine.update(1.0 / 60.0);
    }
    assert!(engine.simulation_mut().boost(attacker, Vec3::z()));
    for _ in 0..60 {
        engine.update(1.0 / 60.0);
    }

    let events = engine.simulation_mut().drain_events();
    let hits: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventType::VehicleDamaged)
        .collect();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|e| e.get_amount().is_some_and(|amount| amount > 0.0)));

    let target = engine.simulation().vehicle(target).unwrap();
    assert!(target.health() < target.max_health());
    assert!(events.iter().any(|e| e.event_type == EventType::BoostFired));
}

#[test]
fn parked_vehicle_comes_to_rest_on_its_wheels() {
    let mut engine = engine_with_arena();
    let key = spawn_vehicle(&mut engine, Vec3::new(0.0, 2.0, 0.0));

    for _ in 0..180 {
        engine.update(1.0 / 60.0);
    }

    let simulation = engine.simulation();
    let vehicle = simulation.vehicle(key).unwrap();
    assert!(!vehicle.is_in_air());
    assert!(vehicle.forward_speed(simulation.physics()).abs() < 0.2);
    assert_relative_eq!(vehicle.health(), vehicle.max_health());

    let chassis = simulation.transform(key).unwrap();
    assert!(chassis.position.y > 0.4 && chassis.position.y < 1.5, "chassis settled at {}", chassis.position.y);
    let wheels = vehicle.wheel_poses();
    assert_eq!(wheels.len(), 4);
    assert!(wheels.iter().all(|pose| pose.position.y < 0.0));
}

#[test]
fn engine_config_loads_from_toml_file() {
    let path = std::env::temp_dir().join(format!("combat_engine_arena_{}.toml", std::process::id()));
    let config = SimulationConfig::default().with_fixed_timestep(0.02).with_log_level("debug");
    config.save_to_file(&path).unwrap();

    let mut engine = Engine::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(engine.config(), &config);
    assert_eq!(engine.update(0.05), 2);
    assert_relative_eq!(engine.alpha(), 0.5, epsilon = 1e-4);
}
