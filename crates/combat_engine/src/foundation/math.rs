//! Math utilities and types
//!
//! Provides the nalgebra aliases shared with the physics layer and the
//! position/rotation/scale [`Transform`] used by every scene node.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (colours are stored as RGBA)
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid pose (rotation + translation), the physics engine's pose representation
pub type Isometry = nalgebra::Isometry3<f32>;

/// World reference axes.
///
/// The engine is Y-up with vehicles driving along local +Z; local +X is the
/// vehicle's left-hand side.
pub mod axes {
    use super::Vec3;

    /// Reference up axis (+Y)
    pub fn up() -> Vec3 {
        Vec3::y()
    }

    /// Reference right axis (-X)
    pub fn right() -> Vec3 {
        -Vec3::x()
    }

    /// Reference forward axis (+Z)
    pub fn forward() -> Vec3 {
        Vec3::z()
    }
}

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Build a transform from configuration-style values: Euler angles in degrees (XYZ).
    pub fn from_euler_degrees(position: Vec3, euler_degrees: Vec3, scale: Vec3) -> Self {
        let rotation = Quat::from_euler_angles(
            utils::deg_to_rad(euler_degrees.x),
            utils::deg_to_rad(euler_degrees.y),
            utils::deg_to_rad(euler_degrees.z),
        );
        Self { position, rotation, scale }
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Convert to a physics pose. Scale is not part of a rigid pose and is dropped.
    pub fn to_isometry(&self) -> Isometry {
        Isometry::from_parts(self.position.into(), self.rotation)
    }

    /// Create a transform from a physics pose with unit scale
    pub fn from_isometry(isometry: &Isometry) -> Self {
        Self::from_position_rotation(isometry.translation.vector, isometry.rotation)
    }

    /// Overwrite position and rotation from a physics pose, keeping the current scale
    pub fn set_isometry(&mut self, isometry: &Isometry) {
        self.position = isometry.translation.vector;
        self.rotation = isometry.rotation;
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Local +Z expressed in the parent frame
    pub fn forward(&self) -> Vec3 {
        self.rotation * axes::forward()
    }

    /// Local right (-X) expressed in the parent frame
    pub fn right(&self) -> Vec3 {
        self.rotation * axes::right()
    }

    /// Local +Y expressed in the parent frame
    pub fn up(&self) -> Vec3 {
        self.rotation * axes::up()
    }

    /// Create a transform from a transformation matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let rotation_matrix = Matrix3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Compose `self` (parent) with `child`, yielding the child's transform in the parent's frame
    pub fn combine(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_scale.component_mul(&(inv_rotation * -self.position));

        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Move `current` towards `target` by at most `max_delta`
    pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
        if current < target {
            (current + max_delta).min(target)
        } else {
            (current - max_delta).max(target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combine_places_child_in_parent_frame() {
        let parent = Transform::from_position_rotation(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), constants::PI / 2.0),
        );
        let child = Transform::from_position(Vec3::new(0.0, 0.0, 2.0));

        let global = parent.combine(&child);

        // +Z rotated 90 degrees about Y becomes +X
        assert_relative_eq!(global.position, Vec3::new(12.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_undoes_combine() {
        let transform = Transform::from_euler_degrees(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 45.0, 10.0),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let point = Point3::new(0.5, -1.0, 4.0);

        let there = transform.transform_point(point);
        let back = transform.inverse().transform_point(there);

        assert_relative_eq!(back, point, epsilon = 1e-4);
    }

    #[test]
    fn test_isometry_conversion_keeps_scale_out_of_pose() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 1.0, 0.0))
            .with_scale(Vec3::new(3.0, 3.0, 3.0));
        let pose = Isometry::translation(4.0, 5.0, 6.0);

        transform.set_isometry(&pose);

        assert_relative_eq!(transform.position, Vec3::new(4.0, 5.0, 6.0));
        assert_relative_eq!(transform.scale, Vec3::new(3.0, 3.0, 3.0));
        assert_relative_eq!(transform.to_isometry().translation.vector, pose.translation.vector);
    }

    #[test]
    fn test_directional_axes() {
        let turned = Transform::from_position_rotation(
            Vec3::zeros(),
            Quat::from_axis_angle(&Vec3::y_axis(), constants::PI),
        );

        assert_relative_eq!(turned.forward(), -Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(turned.up(), Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(Transform::identity().right(), -Vec3::x());
    }

    #[test]
    fn test_approach_never_overshoots() {
        assert_relative_eq!(utils::approach(0.0, 1.0, 0.3), 0.3);
        assert_relative_eq!(utils::approach(0.9, 1.0, 0.3), 1.0);
        assert_relative_eq!(utils::approach(0.0, -1.0, 5.0), -1.0);
    }
}
