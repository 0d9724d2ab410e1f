//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the scene [`math::Transform`]
//! - Simulation clock and fixed stepping
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
