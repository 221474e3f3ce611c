//! Cosmetic animation of the ball model
//!
//! Nothing here feeds back into the simulation except the collider radius,
//! which follows the visual deformation so the ball doesn't clip while
//! stretched.

use glam::{Mat4, Quat, Vec3};
use rollerball_core::math::{is_zero, lerp, move_towards, move_towards_f32, safe_divisor};
use rollerball_core::{AnimationCurve, Transform};

/// Rate at which the turning deformation settles (scale units per second)
const TURNING_SETTLE_RATE: f32 = 1.0;

/// Spin target multiplier for the simplified spin used on steep ground and in the air
const FREE_SPIN_BOOST: f32 = 1.5;

/// One running squash-and-stretch
#[derive(Debug, Clone)]
pub struct SquashStretch {
    curve: AnimationCurve,
    duration: f32,
    elapsed: f32,
    forward_scale: f32,
}

impl SquashStretch {
    pub fn new(curve: AnimationCurve, duration: f32) -> Self {
        let forward_scale = curve.evaluate(0.0);
        Self {
            curve,
            duration: duration.max(0.0),
            elapsed: 0.0,
            forward_scale,
        }
    }

    /// Advance by `dt`. Returns false once the animation has run its course.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed > self.duration {
            return false;
        }
        self.forward_scale = self.curve.evaluate(self.elapsed / safe_divisor(self.duration));
        true
    }

    /// Scale along the stretch axis
    pub fn forward_scale(&self) -> f32 {
        self.forward_scale
    }

    /// Scale across the stretch axis, keeping the volume roughly constant
    pub fn plane_scale(&self) -> f32 {
        2.0 - self.forward_scale
    }

    /// Helper-space scale: X/Y across the axis, Z along it
    pub fn scale(&self) -> Vec3 {
        let plane = self.plane_scale();
        Vec3::new(plane, plane, self.forward_scale)
    }

    /// Collider radius that keeps the deformed ball inside its collider
    pub fn collider_radius(&self, base_radius: f32) -> f32 {
        if self.forward_scale >= 1.0 {
            base_radius / safe_divisor(self.forward_scale)
        } else {
            base_radius / safe_divisor(self.plane_scale())
        }
    }
}

/// Visual state of the rolling ball
#[derive(Debug, Clone)]
pub struct CosmeticAnimator {
    /// Undeformed collider radius
    sphere_radius: f32,
    /// Smoothed velocity driving the roll
    spin_velocity: Vec3,
    /// Orientation of the rolling model
    model_rotation: Quat,
    /// Vertical scale from the turning deformation
    turning_scale: f32,
    /// Orientation of the squash helper; its +Z is the stretch axis
    helper_rotation: Quat,
    squash: Option<SquashStretch>,
}

impl CosmeticAnimator {
    pub fn new(sphere_radius: f32) -> Self {
        Self {
            sphere_radius,
            spin_velocity: Vec3::ZERO,
            model_rotation: Quat::IDENTITY,
            turning_scale: 1.0,
            helper_rotation: Quat::IDENTITY,
            squash: None,
        }
    }

    pub fn spin_velocity(&self) -> Vec3 {
        self.spin_velocity
    }

    pub fn model_rotation(&self) -> Quat {
        self.model_rotation
    }

    pub fn turning_scale(&self) -> f32 {
        self.turning_scale
    }

    pub fn squash(&self) -> Option<&SquashStretch> {
        self.squash.as_ref()
    }

    /// Spin while grounded on walkable ground.
    ///
    /// Follows the actual plane velocity while steering along it. When
    /// steering against it the spin flips straight to the input direction,
    /// which reads as the ball spinning out before it reverses.
    #[allow(clippy::too_many_arguments)]
    pub fn spin_grounded(
        &mut self,
        desired: Vec3,
        plane_velocity: Vec3,
        max_speed: f32,
        acceleration: f32,
        turning_factor: f32,
        turning_squash: f32,
        up: Vec3,
        gravity_magnitude: f32,
        dt: f32,
    ) {
        let rate = acceleration / safe_divisor(self.sphere_radius) * dt;

        if desired.dot(plane_velocity) >= 0.0 {
            self.spin_velocity = move_towards(self.spin_velocity, plane_velocity, rate);
            self.roll(self.spin_velocity, up, dt);
            self.deform_turning(plane_velocity, 1.0, gravity_magnitude, dt);
        } else {
            if desired.dot(self.spin_velocity) < 0.0 {
                self.spin_velocity = Vec3::ZERO;
            }
            let target = desired * max_speed * turning_factor;
            self.spin_velocity = move_towards(self.spin_velocity, target, rate);
            self.roll(self.spin_velocity, up, dt);
            self.deform_turning(plane_velocity, turning_squash, gravity_magnitude, dt);
        }
    }

    /// Spin on steep ground, in the air and during dashes: spin up toward
    /// the input, spin down without it
    pub fn spin_free(
        &mut self,
        desired: Vec3,
        max_speed: f32,
        acceleration: f32,
        deceleration: f32,
        up: Vec3,
        gravity_magnitude: f32,
        dt: f32,
    ) {
        self.spin_velocity = if is_zero(desired) {
            move_towards(self.spin_velocity, Vec3::ZERO, deceleration * dt)
        } else {
            let target = desired * max_speed * FREE_SPIN_BOOST;
            move_towards(
                self.spin_velocity,
                target,
                (acceleration + gravity_magnitude) * dt,
            )
        };
        self.roll(self.spin_velocity, up, dt);
    }

    /// Roll the model without slipping: about `up × velocity` at `|v| / r`
    pub fn roll(&mut self, velocity: Vec3, up: Vec3, dt: f32) {
        let Some(axis) = up.cross(velocity).try_normalize() else {
            return;
        };
        let angle = velocity.length() / safe_divisor(self.sphere_radius) * dt;
        self.model_rotation = (Quat::from_axis_angle(axis, angle) * self.model_rotation).normalize();
    }

    /// Ease the vertical scale toward the deformation for the current speed
    fn deform_turning(&mut self, velocity: Vec3, max_deformation: f32, gravity_magnitude: f32, dt: f32) {
        let speed_ratio = (velocity.length() / safe_divisor(gravity_magnitude)).clamp(0.0, 1.0);
        let target = lerp(1.0, max_deformation, speed_ratio);
        self.turning_scale = move_towards_f32(self.turning_scale, target, TURNING_SETTLE_RATE * dt);
    }

    /// Point the squash helper's stretch axis along `direction`
    pub fn orient_helper(&mut self, direction: Vec3) {
        if !is_zero(direction) {
            self.helper_rotation = Transform::look_rotation(direction);
        }
    }

    /// Start a squash-and-stretch, replacing any running one
    pub fn start_squash(&mut self, curve: AnimationCurve, duration: f32, direction: Vec3) {
        self.cancel_squash();
        self.orient_helper(direction);
        self.squash = Some(SquashStretch::new(curve, duration));
    }

    /// Stop the running squash-and-stretch and restore the rest shape
    pub fn cancel_squash(&mut self) {
        self.squash = None;
    }

    /// Stop every animation and return to the rest shape
    pub fn cancel_all(&mut self) {
        self.cancel_squash();
        self.turning_scale = 1.0;
    }

    /// Advance timed animations by one fixed step
    pub fn tick(&mut self, dt: f32) {
        if let Some(squash) = self.squash.as_mut() {
            if !squash.advance(dt) {
                self.squash = None;
            }
        }
    }

    /// Radius the physics collider should have this step
    pub fn collider_radius(&self) -> f32 {
        match &self.squash {
            Some(squash) => squash.collider_radius(self.sphere_radius),
            None => self.sphere_radius * self.turning_scale,
        }
    }

    /// Non-uniform scale applied by the squash helper, in helper space
    pub fn helper_scale(&self) -> Vec3 {
        self.squash.as_ref().map_or(Vec3::ONE, SquashStretch::scale)
    }

    /// World matrix of the visual model at `position`.
    ///
    /// The squash is applied in the helper's frame so the stretch follows the
    /// jump normal or dash direction regardless of how the ball has rolled.
    pub fn visual_matrix(&self, position: Vec3) -> Mat4 {
        let helper = Mat4::from_quat(self.helper_rotation)
            * Mat4::from_scale(self.helper_scale())
            * Mat4::from_quat(self.helper_rotation.inverse());
        let turning = Mat4::from_scale(Vec3::new(1.0, self.turning_scale, 1.0));

        Mat4::from_translation(position) * helper * turning * Mat4::from_quat(self.model_rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollerball_core::Keyframe;

    #[test]
    fn test_roll_about_up_cross_velocity() {
        let mut animator = CosmeticAnimator::new(0.5);
        animator.roll(Vec3::new(1.0, 0.0, 0.0), Vec3::Y, 0.5);

        // 1 m/s for 0.5 s on a 0.5 m radius is one radian about -Z
        let expected = Quat::from_axis_angle(Vec3::NEG_Z, 1.0);
        assert!(animator.model_rotation().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_roll_ignores_vertical_velocity() {
        let mut animator = CosmeticAnimator::new(0.5);
        animator.roll(Vec3::new(0.0, -3.0, 0.0), Vec3::Y, 0.02);
        assert_eq!(animator.model_rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_spin_follows_plane_velocity() {
        let mut animator = CosmeticAnimator::new(0.5);
        let velocity = Vec3::new(2.0, 0.0, 0.0);
        for _ in 0..100 {
            animator.spin_grounded(Vec3::X, velocity, 6.0, 6.0, 1.5, 0.8, Vec3::Y, 9.81, 0.02);
        }
        assert!(animator.spin_velocity().abs_diff_eq(velocity, 1e-4));
        assert!((animator.turning_scale() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_turning_squashes_ball() {
        let mut animator = CosmeticAnimator::new(0.5);
        let velocity = Vec3::new(20.0, 0.0, 0.0);
        for _ in 0..100 {
            animator.spin_grounded(Vec3::NEG_X, velocity, 6.0, 6.0, 1.5, 0.8, Vec3::Y, 9.81, 0.02);
        }
        assert!((animator.turning_scale() - 0.8).abs() < 1e-4);
        assert!((animator.collider_radius() - 0.4).abs() < 1e-4);
        assert!(animator.spin_velocity().x < 0.0);
    }

    #[test]
    fn test_squash_runs_for_duration() {
        let mut animator = CosmeticAnimator::new(0.5);
        let curve = AnimationCurve::new(vec![Keyframe::new(0.0, 1.0), Keyframe::new(1.0, 2.0)]).unwrap();
        animator.start_squash(curve, 0.1, Vec3::Y);

        animator.tick(0.05);
        let squash = animator.squash().unwrap();
        assert!((squash.forward_scale() - 1.5).abs() < 1e-5);
        assert!((animator.collider_radius() - 0.5 / 1.5).abs() < 1e-5);

        animator.tick(0.06);
        assert!(animator.squash().is_none());
        assert_eq!(animator.collider_radius(), 0.5);
    }

    #[test]
    fn test_new_squash_replaces_running_one() {
        let mut animator = CosmeticAnimator::new(0.5);
        animator.start_squash(AnimationCurve::constant(1.5), 1.0, Vec3::Y);
        animator.tick(0.5);
        animator.start_squash(AnimationCurve::constant(0.5), 1.0, Vec3::X);
        animator.tick(0.02);

        let squash = animator.squash().unwrap();
        assert_eq!(squash.forward_scale(), 0.5);
        assert!((animator.collider_radius() - 0.5 / 1.5).abs() < 1e-5);

        animator.cancel_squash();
        assert_eq!(animator.helper_scale(), Vec3::ONE);
    }

    #[test]
    fn test_collider_radius_never_divides_by_zero() {
        let squash = SquashStretch::new(AnimationCurve::constant(2.0), 1.0);
        assert!(squash.collider_radius(0.5).is_finite());
        let flat = SquashStretch::new(AnimationCurve::constant(0.0), 1.0);
        assert!(flat.collider_radius(0.5).is_finite());
    }

    #[test]
    fn test_visual_matrix_stretches_along_helper_axis() {
        let mut animator = CosmeticAnimator::new(0.5);
        animator.start_squash(AnimationCurve::constant(1.5), 1.0, Vec3::Y);
        animator.tick(0.02);

        let matrix = animator.visual_matrix(Vec3::ZERO);
        let up = matrix.transform_vector3(Vec3::Y);
        let side = matrix.transform_vector3(Vec3::X);
        assert!((up.length() - 1.5).abs() < 1e-4);
        assert!((side.length() - 0.5).abs() < 1e-4);
    }
}
