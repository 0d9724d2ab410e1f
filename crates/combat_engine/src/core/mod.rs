//! # Core Engine Module
//!
//! Shared configuration and the explicit per-frame context passed to every
//! component update.
//!
//! ## Organization
//!
//! - **Config**: typed simulation settings (physics, collision table, materials)
//! - **Context**: clock and render-target state for the current step

pub mod config;
pub mod context;

pub use config::{
    CollisionGroupConfig,
    MaterialConfig,
    PhysicsConfig,
    RenderTargetConfig,
    SimulationConfig,
    Config,
    ConfigError,
};
pub use context::SimulationContext;
