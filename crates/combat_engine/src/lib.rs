//! # Combat Engine
//!
//! Engine core for vehicle-combat games: ray-cast vehicles on a rigid-body
//! world, shape and filter binding, particle feedback and timed power-ups.
//!
//! ## Features
//!
//! - **Vehicles**: N-wheel ray-cast solver coupled to a chassis body, with
//!   input smoothing, boost, damage and power-ups
//! - **Physics**: rapier3d world with named collision groups, shared
//!   materials and drivable-surface query filters
//! - **Particles**: point-sprite pools backed by device vertex buffers
//! - **Simulation**: fixed-step orchestration with contact dispatch and
//!   gameplay events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use combat_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(SimulationConfig::default())?;
//!     let assets = VehicleAssets::headless(engine.simulation().physics());
//!     let vehicle = VehicleComponent::new(4, true, &assets)?;
//!     let key = engine
//!         .simulation_mut()
//!         .spawn_vehicle(vehicle, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))?;
//!
//!     if let Some(vehicle) = engine.simulation_mut().vehicle_mut(key) {
//!         vehicle.handle_acceleration(1.0, 0.0);
//!     }
//!     engine.update(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

// Simulation building blocks
pub mod ecs;
pub mod events;
pub mod physics;
pub mod render;
pub mod scene;

// Tooling
pub mod debug;

mod engine;
pub mod simulation;

pub use engine::{Engine, EngineError};
pub use simulation::{Body, BodyKey, Simulation};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Body, BodyKey, Engine, EngineError, Simulation,
        core::{SimulationConfig, SimulationContext},
        config::ConfigDocument,
        foundation::{
            math::{Vec3, Quat, Transform},
            time::Time,
        },
        ecs::{Component, Entity, World},
        ecs::components::{
            Collider, MeshAsset, MeshComponent, ParticleEmitterComponent, PowerUp, PowerUpComponent, PowerUpKind,
            RigidDynamicComponent, VehicleAssets, VehicleComponent, VehicleError,
        },
        events::{Event, EventType},
        physics::{ColliderGeometry, PhysicsWorld, QueryFilterType},
        debug::{DebugUi, RecordingUi},
    };
}
