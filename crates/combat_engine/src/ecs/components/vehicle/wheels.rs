//! Wheel layout and solver wheel poses

use rapier3d::control::Wheel;

use super::descriptor::{AxleData, DEFAULT_AXLES};
use crate::foundation::math::{Isometry, Point3, Quat, Transform, Unit, Vec3};

/// Fraction of the chassis half-length the outermost generated axles sit at
const GENERATED_AXLE_SPREAD: f32 = 0.6;

/// Segments around a wheel's convex hull
const WHEEL_HULL_SEGMENTS: usize = 16;

/// Round a wheel count up to a usable even number
pub fn normalize_wheel_count(wheel_count: usize) -> usize {
    if wheel_count < 2 {
        log::warn!("Vehicle needs at least 2 wheels, got {}", wheel_count);
        2
    } else if wheel_count % 2 == 1 {
        log::warn!("Odd wheel count {} rounded up to {}", wheel_count, wheel_count + 1);
        wheel_count + 1
    } else {
        wheel_count
    }
}

/// Keep `axles` when they match the wheel count, otherwise spread
/// `wheel_count / 2` axles evenly along the chassis length
pub fn layout_axles(axles: &[AxleData], wheel_count: usize, chassis_length: f32) -> Vec<AxleData> {
    let axle_count = wheel_count / 2;
    if axles.len() == axle_count {
        return axles.to_vec();
    }

    let inset = axles
        .first()
        .or_else(|| DEFAULT_AXLES.first())
        .map_or(0.9, AxleData::wheel_inset);
    let front = chassis_length * 0.5 * GENERATED_AXLE_SPREAD;
    log::debug!(
        "Generating {} axles for {} wheels (configured {})",
        axle_count,
        wheel_count,
        axles.len()
    );

    (0..axle_count)
        .map(|i| {
            let t = if axle_count > 1 { i as f32 / (axle_count - 1) as f32 } else { 0.5 };
            AxleData::new(front - 2.0 * front * t, inset)
        })
        .collect()
}

/// Chassis-local wheel centres, left then right for each axle front to back
pub fn wheel_offsets(axles: &[AxleData], chassis_size: Vec3) -> Vec<Vec3> {
    let y = -chassis_size.y * 0.5;
    axles
        .iter()
        .flat_map(|axle| {
            [
                Vec3::new(axle.wheel_inset(), y, axle.center_offset()),
                Vec3::new(-axle.wheel_inset(), y, axle.center_offset()),
            ]
        })
        .collect()
}

/// Points of a wheel-shaped hull around the local X axle
pub fn wheel_hull_points(radius: f32, width: f32) -> Vec<Point3> {
    let half_width = width * 0.5;
    (0..WHEEL_HULL_SEGMENTS)
        .flat_map(|i| {
            let angle = i as f32 / WHEEL_HULL_SEGMENTS as f32 * std::f32::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            [
                Point3::new(-half_width, radius * sin, radius * cos),
                Point3::new(half_width, radius * sin, radius * cos),
            ]
        })
        .collect()
}

/// Pose of a solver wheel relative to the chassis.
///
/// `chassis_pose` must be the pose the solver placed the wheel from (the
/// chassis pose at the start of its last update). The rotation is the
/// steering about the suspension axis followed by the spin about the axle.
pub fn wheel_local_pose(chassis_pose: &Isometry, wheel: &Wheel) -> Transform {
    let position = chassis_pose.inverse_transform_point(&wheel.center()).coords;
    let steering = Quat::from_axis_angle(&Vec3::y_axis(), wheel.steering);
    // rolling forward turns the front of the tyre down
    let spin = Unit::try_new(-wheel.axle_cs, 1.0e-6)
        .map(|axle| Quat::from_axis_angle(&axle, wheel.rotation))
        .unwrap_or_else(Quat::identity);
    Transform::from_position_rotation(position, steering * spin)
}
