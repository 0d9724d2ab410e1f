//! Driver input
//!
//! Gameplay writes clamped values into a [`VehicleRawInput`] buffer; once
//! per step the buffer is turned into smoothed [`DriveControls`] according to
//! the vehicle's [`InputMode`].

use crate::foundation::math::utils;

/// Forward speed (m/s) under which backward input reverses instead of braking
pub const REVERSE_SPEED_THRESHOLD: f32 = 1.0;

/// How raw input values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys: values are thresholded to 0 or 1
    #[default]
    Digital,
    /// Gamepad: values are used as given
    Analog,
}

/// Raw input written by gameplay, consumed on the next step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleRawInput {
    /// Left (+) / right (-) in [-1, 1]
    pub steer: f32,
    /// Throttle in [0, 1]
    pub forward: f32,
    /// Brake or reverse in [0, 1]
    pub backward: f32,
    /// Handbrake in [0, 1]
    pub handbrake: f32,
}

impl VehicleRawInput {
    /// Set steering, clamped to [-1, 1]
    pub fn set_steer(&mut self, amount: f32) {
        self.steer = clamp_finite(amount, -1.0, 1.0);
    }

    /// Set throttle and brake/reverse, each clamped to [0, 1]
    pub fn set_acceleration(&mut self, forward: f32, backward: f32) {
        self.forward = clamp_finite(forward, 0.0, 1.0);
        self.backward = clamp_finite(backward, 0.0, 1.0);
    }

    /// Set handbrake, clamped to [0, 1]
    pub fn set_handbrake(&mut self, amount: f32) {
        self.handbrake = clamp_finite(amount, 0.0, 1.0);
    }

    /// Release every control
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

/// Rise and fall rates (units per second) for one control
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rates {
    rise: f32,
    fall: f32,
}

/// Smoothing rates per control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingData {
    accel: Rates,
    brake: Rates,
    handbrake: Rates,
    steer: Rates,
}

impl SmoothingData {
    /// Rates for keyboard input
    pub const KEYS: Self = Self {
        accel: Rates { rise: 6.0, fall: 10.0 },
        brake: Rates { rise: 6.0, fall: 10.0 },
        handbrake: Rates { rise: 12.0, fall: 12.0 },
        steer: Rates { rise: 2.5, fall: 5.0 },
    };

    /// Rates for gamepad input
    pub const PAD: Self = Self {
        accel: Rates { rise: 6.0, fall: 12.0 },
        brake: Rates { rise: 6.0, fall: 12.0 },
        handbrake: Rates { rise: 12.0, fall: 12.0 },
        steer: Rates { rise: 2.5, fall: 5.0 },
    };

    /// Rates for a mode
    pub fn for_mode(mode: InputMode) -> Self {
        match mode {
            InputMode::Digital => Self::KEYS,
            InputMode::Analog => Self::PAD,
        }
    }
}

/// Steering scale at forward speed (m/s), linearly interpolated
const STEER_VS_FORWARD_SPEED: [(f32, f32); 4] = [(0.0, 0.75), (5.0, 0.75), (30.0, 0.125), (120.0, 0.1)];

/// Steering attenuation for a forward speed
pub fn steer_scale(forward_speed: f32) -> f32 {
    let speed = forward_speed.abs();
    let (first_speed, first_scale) = STEER_VS_FORWARD_SPEED[0];
    if speed <= first_speed {
        return first_scale;
    }
    for pair in STEER_VS_FORWARD_SPEED.windows(2) {
        let ((s0, k0), (s1, k1)) = (pair[0], pair[1]);
        if speed <= s1 {
            return utils::lerp(k0, k1, (speed - s0) / (s1 - s0));
        }
    }
    STEER_VS_FORWARD_SPEED[STEER_VS_FORWARD_SPEED.len() - 1].1
}

/// Smoothed control values handed to the solver
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveControls {
    /// Signed throttle in [-1, 1]; negative drives in reverse
    pub throttle: f32,
    /// Brake in [0, 1]
    pub brake: f32,
    /// Handbrake in [0, 1]
    pub handbrake: f32,
    /// Steering in [-1, 1], already attenuated by speed
    pub steer: f32,
}

/// Input smoothing state carried between steps
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSmoother {
    accel: f32,
    brake: f32,
    handbrake: f32,
    steer: f32,
}

impl InputSmoother {
    /// Turn raw input into controls for one step of `dt` seconds.
    ///
    /// `forward_speed` is the chassis velocity along its forward axis.
    pub fn update(&mut self, raw: &VehicleRawInput, mode: InputMode, forward_speed: f32, dt: f32) -> DriveControls {
        let raw = match mode {
            InputMode::Digital => VehicleRawInput {
                steer: digital(raw.steer.abs()) * raw.steer.signum(),
                forward: digital(raw.forward),
                backward: digital(raw.backward),
                handbrake: digital(raw.handbrake),
            },
            InputMode::Analog => *raw,
        };
        let rates = SmoothingData::for_mode(mode);

        // throttle drives forward unless rolling backwards; backward reverses only when nearly stopped
        let reversing = forward_speed < REVERSE_SPEED_THRESHOLD;
        let (accel_target, brake_target) = if reversing && raw.backward > 0.0 {
            (-raw.backward, if forward_speed < -REVERSE_SPEED_THRESHOLD { raw.forward } else { 0.0 })
        } else if forward_speed < -REVERSE_SPEED_THRESHOLD && raw.forward > 0.0 {
            (0.0, raw.forward)
        } else {
            (raw.forward, raw.backward)
        };

        self.accel = smooth(self.accel, accel_target, rates.accel, dt);
        self.brake = smooth(self.brake, brake_target, rates.brake, dt);
        self.handbrake = smooth(self.handbrake, raw.handbrake, rates.handbrake, dt);
        self.steer = smooth(self.steer, raw.steer, rates.steer, dt);

        DriveControls {
            throttle: self.accel,
            brake: self.brake,
            handbrake: self.handbrake,
            steer: self.steer * steer_scale(forward_speed),
        }
    }

    /// Drop all smoothing state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn digital(value: f32) -> f32 {
    if value >= 0.5 {
        1.0
    } else {
        0.0
    }
}

fn smooth(current: f32, target: f32, rates: Rates, dt: f32) -> f32 {
    let rising = target.abs() > current.abs() && target * current >= 0.0;
    let rate = if rising { rates.rise } else { rates.fall };
    utils::approach(current, target, rate * dt.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raw_input_is_clamped() {
        let mut raw = VehicleRawInput::default();
        raw.set_steer(-3.0);
        raw.set_acceleration(2.0, -1.0);
        raw.set_handbrake(f32::NAN);

        assert_eq!(raw, VehicleRawInput { steer: -1.0, forward: 1.0, backward: 0.0, handbrake: 0.0 });
    }

    #[test]
    fn test_digital_input_is_thresholded_and_smoothed() {
        let mut smoother = InputSmoother::default();
        let raw = VehicleRawInput { forward: 0.6, ..Default::default() };

        let first = smoother.update(&raw, InputMode::Digital, 10.0, 0.1);
        assert_relative_eq!(first.throttle, 0.6, epsilon = 1e-6);

        let second = smoother.update(&raw, InputMode::Digital, 10.0, 0.1);
        assert_relative_eq!(second.throttle, 1.0);

        let released = smoother.update(&VehicleRawInput::default(), InputMode::Digital, 10.0, 0.05);
        assert_relative_eq!(released.throttle, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_analog_input_below_threshold_is_kept() {
        let mut smoother = InputSmoother::default();
        let raw = VehicleRawInput { forward: 0.3, ..Default::default() };

        let controls = smoother.update(&raw, InputMode::Analog, 10.0, 1.0);

        assert_relative_eq!(controls.throttle, 0.3);
    }

    #[test]
    fn test_backward_brakes_when_moving_and_reverses_when_stopped() {
        let raw = VehicleRawInput { backward: 1.0, ..Default::default() };

        let moving = InputSmoother::default().update(&raw, InputMode::Analog, 15.0, 1.0);
        assert_relative_eq!(moving.brake, 1.0);
        assert_relative_eq!(moving.throttle, 0.0);

        let stopped = InputSmoother::default().update(&raw, InputMode::Analog, 0.2, 1.0);
        assert_relative_eq!(stopped.brake, 0.0);
        assert_relative_eq!(stopped.throttle, -1.0);
    }

    #[test]
    fn test_steering_attenuates_with_speed() {
        assert_relative_eq!(steer_scale(0.0), 0.75);
        assert_relative_eq!(steer_scale(-5.0), 0.75);
        assert_relative_eq!(steer_scale(17.5), 0.4375);
        assert_relative_eq!(steer_scale(500.0), 0.1);

        let raw = VehicleRawInput { steer: -1.0, ..Default::default() };
        let controls = InputSmoother::default().update(&raw, InputMode::Analog, 30.0, 1.0);
        assert_relative_eq!(controls.steer, -0.125);
    }
}
