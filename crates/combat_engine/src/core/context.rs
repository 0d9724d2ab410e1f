//! Per-frame simulation context
//!
//! Replaces the global time and graphics singletons: every update receives
//! the current clock, the step length and the render-target settings
//! explicitly.

use super::config::RenderTargetConfig;
use crate::foundation::time::Time;

/// Clock and output settings handed to every update call
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationContext {
    /// Current simulation time
    pub time: Time,
    /// Length of the current step in seconds
    pub delta: f32,
    /// Output surface settings
    pub render_target: RenderTargetConfig,
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl SimulationContext {
    /// Context at time zero stepping by `delta`
    pub fn new(delta: f32) -> Self {
        Self {
            time: Time::ZERO,
            delta,
            render_target: RenderTargetConfig::default(),
        }
    }

    /// Builder pattern: start at a given time
    pub fn at(mut self, seconds: f64) -> Self {
        self.time = Time::from_seconds(seconds);
        self
    }

    /// Move the clock forward by one step
    pub fn advance(&mut self) {
        self.time = self.time + f64::from(self.delta);
    }
}
