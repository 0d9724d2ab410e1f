//! Core engine implementation
//!
//! Couples a [`Simulation`] with the fixed-step accumulator so hosts can
//! feed variable frame times and get whole simulation steps.

use std::path::Path;

use thiserror::Error;

use crate::core::{Config, ConfigError, SimulationConfig};
use crate::ecs::components::VehicleError;
use crate::foundation::time::FixedTimestep;
use crate::physics::PhysicsError;
use crate::simulation::Simulation;

/// Main engine struct
///
/// The engine owns the simulation and decides how many fixed steps each
/// frame runs.
pub struct Engine {
    /// Engine configuration
    config: SimulationConfig,

    /// Bodies, physics and scene
    simulation: Simulation,

    /// Frame time to fixed step conversion
    timestep: FixedTimestep,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        log::info!(
            "Initializing engine: step {:.4}s, {} collision groups, {} materials",
            config.physics.fixed_timestep,
            config.collision_groups.len(),
            config.materials.len()
        );

        let simulation = Simulation::new(&config);
        let timestep = FixedTimestep::new(config.physics.fixed_timestep, config.physics.max_steps_per_frame);

        Ok(Self {
            config,
            simulation,
            timestep,
        })
    }

    /// Load the configuration from a `.toml` or `.ron` file and create the engine
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let config = SimulationConfig::load_from_file(path)?;
        Self::new(config)
    }

    /// Advance by a frame of `frame_delta` seconds; returns the number of steps run
    pub fn update(&mut self, frame_delta: f32) -> u32 {
        let steps = self.timestep.accumulate(frame_delta);
        for _ in 0..steps {
            self.simulation.step();
        }
        steps
    }

    /// Get the simulation
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Get mutable access to the simulation
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Get the configuration the engine was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps run since creation
    pub fn total_steps(&self) -> u64 {
        self.timestep.total_steps()
    }

    /// Interpolation factor for rendering between the last two steps
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A physics resource could not be created
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// A vehicle rig could not be created
    #[error("Vehicle error: {0}")]
    Vehicle(#[from] VehicleError),
}
