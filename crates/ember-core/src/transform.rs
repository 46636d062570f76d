//! Entity transform

use glam::{Mat4, Vec3};

/// Position, rotation (Euler angles in degrees) and scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation in degrees, applied X then Y then Z in the model matrix
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix `T * Rx * Ry * Rz * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_default() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Vec3::new(0.0, 90.0, 0.0))
            .with_scale(Vec3::splat(2.0));
        let p = t.to_matrix().transform_point3(Vec3::X);
        // X scaled to 2, rotated 90 degrees about Y lands on -Z.
        assert!((p - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5, "{p:?}");
    }
}
