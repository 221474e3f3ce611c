//! Vector helpers used by the ball controller
//!
//! These mirror the small set of engine-side vector utilities the controller
//! relies on (plane projection, move-towards, angle measurement), written over
//! `glam` so they behave identically in every backend.

use glam::{Quat, Vec3};

/// Squared length under which a vector is treated as the zero sentinel.
pub const ZERO_EPSILON_SQ: f32 = 1e-10;

/// Smallest magnitude accepted as a divisor before it gets clamped.
pub const MIN_DIVISOR: f32 = 1e-4;

/// Whether a vector is (numerically) the zero vector
pub fn is_zero(v: Vec3) -> bool {
    v.length_squared() <= ZERO_EPSILON_SQ
}

/// Project `v` onto the direction of `onto`. Returns zero when `onto` is zero.
pub fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.length_squared();
    if len_sq <= ZERO_EPSILON_SQ {
        return Vec3::ZERO;
    }
    onto * (v.dot(onto) / len_sq)
}

/// Remove from `v` its component along `normal`
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - project(v, normal)
}

/// Move a vector towards a target by at most `max_delta`
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let diff = target - current;
    let distance = diff.length();

    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + diff / distance * max_delta
    }
}

/// Scalar version of [`move_towards`]
pub fn move_towards_f32(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Clamp the length of `v` to at most `max_length`
pub fn clamp_magnitude(v: Vec3, max_length: f32) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > max_length * max_length && len_sq > 0.0 {
        v * (max_length / len_sq.sqrt())
    } else {
        v
    }
}

/// Unsigned angle between two vectors in degrees. Zero if either is zero.
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom <= ZERO_EPSILON_SQ {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Rotate `v` by the rotation that carries `up` onto `plane_normal`.
///
/// Used to lay a horizontal input direction onto a tilted ground plane so it
/// keeps its heading but follows the surface. Both `up` and `plane_normal`
/// must be unit length; a zero `plane_normal` leaves `v` unchanged.
pub fn rotate_onto_plane(v: Vec3, up: Vec3, plane_normal: Vec3) -> Vec3 {
    if is_zero(plane_normal) || is_zero(up) {
        return v;
    }
    Quat::from_rotation_arc(up, plane_normal) * v
}

/// Linear interpolation clamped to `t ∈ [0, 1]`
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Clamp a divisor away from zero, keeping its sign
pub fn safe_divisor(d: f32) -> f32 {
    if d.abs() < MIN_DIVISOR {
        MIN_DIVISOR.copysign(if d == 0.0 { 1.0 } else { d })
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_on_plane() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let on_plane = project_on_plane(v, Vec3::Y);
        assert_eq!(on_plane, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(project(v, Vec3::Y), Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn test_project_onto_zero_is_zero() {
        assert_eq!(project(Vec3::ONE, Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_move_towards() {
        let result = move_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0);
        assert!((result.x - 5.0).abs() < 0.001);

        let reached = move_towards(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0);
        assert_eq!(reached, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_clamp_magnitude() {
        let v = clamp_magnitude(Vec3::new(0.0, -20.0, 0.0), 12.0);
        assert!((v.length() - 12.0).abs() < 1e-5);
        assert_eq!(clamp_magnitude(Vec3::X, 12.0), Vec3::X);
    }

    #[test]
    fn test_angle_deg() {
        assert!((angle_deg(Vec3::Y, Vec3::X) - 90.0).abs() < 1e-4);
        assert_eq!(angle_deg(Vec3::ZERO, Vec3::X), 0.0);
    }

    #[test]
    fn test_rotate_onto_plane_follows_slope() {
        let normal = Vec3::new(0.0, 1.0, -1.0).normalize();
        let rotated = rotate_onto_plane(Vec3::Z, Vec3::Y, normal);
        assert!(rotated.dot(normal).abs() < 1e-5);
        assert!((rotated.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_safe_divisor() {
        assert_eq!(safe_divisor(0.0), MIN_DIVISOR);
        assert_eq!(safe_divisor(-1e-6), -MIN_DIVISOR);
        assert_eq!(safe_divisor(2.0), 2.0);
    }
}
