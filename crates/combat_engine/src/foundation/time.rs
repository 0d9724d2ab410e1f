//! Time management utilities
//!
//! Simulation time is a monotonically increasing game clock measured in
//! seconds. Timestamps such as the last boost or a power-up expiry are stored
//! as [`Time`] and compared by polling; nothing is scheduled.

use std::ops::{Add, Sub};

/// Point on the simulation clock, in seconds since the simulation started
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Time(f64);

impl Time {
    /// The simulation start
    pub const ZERO: Time = Time(0.0);

    /// Create a timestamp from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Seconds since the simulation started
    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is in the future)
    pub fn since(self, earlier: Time) -> f64 {
        self.0 - earlier.0
    }
}

impl Add<f64> for Time {
    type Output = Time;

    fn add(self, seconds: f64) -> Time {
        Time(self.0 + seconds)
    }
}

impl Sub for Time {
    type Output = f64;

    fn sub(self, other: Time) -> f64 {
        self.since(other)
    }
}

/// Fixed-step accumulator for frame-stepped simulation
///
/// Variable frame deltas are accumulated and converted into a whole number of
/// fixed physics steps, capped so a long stall does not spiral.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps_per_frame: u32,
    accumulator: f32,
    total_steps: u64,
}

impl FixedTimestep {
    /// Create an accumulator producing steps of `step` seconds
    pub fn new(step: f32, max_steps_per_frame: u32) -> Self {
        Self {
            step,
            max_steps_per_frame: max_steps_per_frame.max(1),
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Fixed step length in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add a frame's elapsed time and return how many fixed steps to run
    pub fn accumulate(&mut self, frame_delta: f32) -> u32 {
        self.accumulator += frame_delta.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps_per_frame {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps_per_frame {
            // drop the backlog instead of carrying it into the next frame
            self.accumulator = self.accumulator.min(self.step);
        }

        self.total_steps += u64::from(steps);
        steps
    }

    /// Interpolation factor between the last two steps, in [0, 1)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Steps produced since creation
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_arithmetic() {
        let boost = Time::from_seconds(2.0);
        let now = boost + 1.5;

        assert_relative_eq!(now.since(boost), 1.5);
        assert_relative_eq!(now - boost, 1.5);
        assert!(boost < now);
    }

    #[test]
    fn test_fixed_timestep_accumulates_partial_frames() {
        let mut timestep = FixedTimestep::new(0.01, 8);

        assert_eq!(timestep.accumulate(0.025), 2);
        assert_relative_eq!(timestep.alpha(), 0.5, epsilon = 1e-3);
        assert_eq!(timestep.accumulate(0.006), 1);
        assert_eq!(timestep.total_steps(), 3);
    }

    #[test]
    fn test_fixed_timestep_caps_long_frames() {
        let mut timestep = FixedTimestep::new(0.01, 4);

        assert_eq!(timestep.accumulate(1.0), 4);
        assert!(timestep.alpha() <= 1.0);
    }
}
