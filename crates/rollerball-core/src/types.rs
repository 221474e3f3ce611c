//! Core types used throughout the controller

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Create a new transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Rotation whose local +Z points along `direction`.
    ///
    /// Returns identity for a zero direction.
    pub fn look_rotation(direction: Vec3) -> Quat {
        let Some(dir) = direction.try_normalize() else {
            return Quat::IDENTITY;
        };
        Quat::from_rotation_arc(Vec3::Z, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_rotation_keeps_unit_scale() {
        let rotation = Quat::from_rotation_y(1.0);
        let transform = Transform::from_position_rotation(Vec3::new(1.0, 2.0, 3.0), rotation);
        assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation, rotation);
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_look_rotation_points_forward() {
        let rotation = Transform::look_rotation(Vec3::new(1.0, 0.0, 0.0));
        let forward = rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-5);
        assert_eq!(Transform::look_rotation(Vec3::ZERO), Quat::IDENTITY);
    }
}
