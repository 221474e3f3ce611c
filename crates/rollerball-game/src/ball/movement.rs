//! Velocity integration
//!
//! Velocity is split against the movement plane: the in-plane part is
//! steered by input, the part along the normal is left to the collision
//! response (or gravity, in the air).

use glam::Vec3;
use rollerball_core::math::{
    angle_deg, clamp_magnitude, is_zero, lerp, move_towards, project, project_on_plane,
    rotate_onto_plane,
};
use rollerball_physics::{BallBody, ForceMode};
use tracing::debug;

use super::controller::RollerBall;
use super::state::LocomotionState;
use crate::events::BallEvent;
use crate::ground::GroundTilt;
use crate::profile::MovementProfile;

/// Steering values for one step, derived from the active profile
#[derive(Debug, Clone, Copy)]
struct Steering {
    max_speed: f32,
    acceleration: f32,
    deceleration: f32,
    turning: f32,
}

impl From<MovementProfile> for Steering {
    fn from(profile: MovementProfile) -> Self {
        Self {
            max_speed: profile.max_speed,
            acceleration: profile.acceleration(),
            deceleration: profile.deceleration(),
            turning: 1.0,
        }
    }
}

impl RollerBall {
    /// Steer along the ground for one step
    pub fn grounded_move<B: BallBody + ?Sized>(&mut self, body: &mut B, desired: Vec3) {
        if self.jump.should_jump() {
            self.apply_jump(body);
            return;
        }

        let dt = self.config.fixed_timestep;
        let gravity = self.gravity();
        let up = self.up();
        let normal = self.movement_plane_normal();
        let desired = rotate_onto_plane(self.sanitize_direction(desired), up, normal);

        let velocity = body.velocity();
        let mut plane_velocity = project_on_plane(velocity, normal);
        let aligned_velocity = project(velocity, normal);
        let gravity_on_plane = project_on_plane(gravity, normal);

        self.auto_slope_modifier = if self.config.slopes.is_auto() {
            self.classifier.auto_slope_modifier(angle_deg(normal, up))
        } else {
            1.0
        };
        let modifier = self.auto_slope_modifier;

        let profile = self.movement_profile();
        let mut steer = Steering::from(profile);

        match self.tilt {
            GroundTilt::Flat => {
                if !is_zero(desired * modifier) {
                    steer.turning = self.turning(desired, plane_velocity, profile.turning_factor);
                    steer.max_speed *= modifier;
                    steer.acceleration *= modifier * steer.turning;
                    plane_velocity = move_towards(
                        plane_velocity,
                        desired * steer.max_speed,
                        steer.acceleration * dt,
                    );
                } else {
                    plane_velocity =
                        move_towards(plane_velocity, Vec3::ZERO, steer.deceleration * dt);
                }
                // Hold the ball in place on gentle inclines
                body.add_force(-gravity_on_plane, ForceMode::Acceleration);
                self.spin_on_ground(desired, plane_velocity, steer, up);
            }
            GroundTilt::Slope => {
                let climb = -gravity_on_plane.normalize_or_zero();
                let climb_alignment = desired.dot(climb);

                if !is_zero(desired * modifier) && climb_alignment >= 0.0 {
                    steer.turning = self.turning(desired, plane_velocity, profile.turning_factor);
                    steer.max_speed *= modifier;
                    let flat_acceleration = self.ground_movement().acceleration();
                    steer.acceleration = lerp(flat_acceleration, steer.acceleration, climb_alignment)
                        * modifier
                        * steer.turning;
                    plane_velocity = move_towards(
                        plane_velocity,
                        desired * steer.max_speed,
                        steer.acceleration * dt,
                    );
                    body.add_force(-gravity_on_plane, ForceMode::Acceleration);
                } else {
                    plane_velocity = clamp_magnitude(
                        move_towards(plane_velocity, Vec3::ZERO, steer.deceleration * dt),
                        self.config.fall_speed_cap,
                    );
                }
                self.spin_on_ground(desired, plane_velocity, steer, up);
            }
            GroundTilt::Steep => {
                if !is_zero(desired) {
                    let acceleration = (steer.acceleration * self.config.steep_factor)
                        .clamp(0.0, gravity_on_plane.length());
                    plane_velocity = move_towards(
                        plane_velocity,
                        desired * steer.max_speed,
                        acceleration * dt,
                    );
                    self.emit(BallEvent::Turning);
                } else {
                    plane_velocity = clamp_magnitude(
                        move_towards(plane_velocity, Vec3::ZERO, steer.deceleration * dt),
                        self.config.fall_speed_cap,
                    );
                }
                self.spin_free(desired, steer, up);
            }
        }

        body.set_velocity(plane_velocity + aligned_velocity);
    }

    /// Steer in the air for one step
    pub fn airborne_move<B: BallBody + ?Sized>(&mut self, body: &mut B, desired: Vec3) {
        if self.jump.should_jump() {
            self.apply_jump(body);
            return;
        }

        let dt = self.config.fixed_timestep;
        let gravity = self.gravity();
        let up = self.up();
        let desired = self.sanitize_direction(desired);

        let on_wall = self.config.wall_movement && !is_zero(self.overslope_normal);
        let (normal, desired) = if on_wall {
            (
                self.overslope_normal,
                rotate_onto_plane(desired, up, self.overslope_normal),
            )
        } else {
            (up, desired)
        };

        let velocity = body.velocity();
        let rise = self
            .jump
            .rise_acceleration(velocity, up, gravity, &self.config.jumps);
        if !is_zero(rise) {
            body.add_force(rise, ForceMode::Acceleration);
        }

        let mut plane_velocity = project_on_plane(velocity, normal);
        let aligned_velocity = project(velocity, normal);

        let profile = self.movement_profile();
        let mut steer = Steering::from(profile);

        if !is_zero(desired) {
            if desired.dot(plane_velocity) < 0.0 {
                steer.turning = profile.turning_factor;
            }
            steer.acceleration *= steer.turning;
            if self.config.has_speed_capped_on_jump {
                steer.max_speed = self.takeoff_speed;
            }
            if plane_velocity.length_squared() > steer.max_speed * steer.max_speed {
                steer.acceleration = steer.deceleration;
            }

            let target = if self.config.can_change_direction_in_air {
                desired * steer.max_speed
            } else {
                Vec3::ZERO
            };
            plane_velocity = move_towards(plane_velocity, target, steer.acceleration * dt);
        } else {
            plane_velocity = move_towards(plane_velocity, Vec3::ZERO, steer.deceleration * dt);
        }

        self.spin_free(desired, steer, up);
        body.set_velocity(self.cap_fall_speed(plane_velocity + aligned_velocity));
    }

    /// Launch the pending jump
    fn apply_jump<B: BallBody + ?Sized>(&mut self, body: &mut B) {
        let Some(index) = self.jump.consume(self.config.jumps.len()) else {
            return;
        };
        let Some(spec) = self.config.jumps.get(index) else {
            return;
        };
        let curve = spec.animation_curve.clone();

        let gravity = self.gravity();
        let up = self.up();
        let jump_normal = match self.state {
            LocomotionState::Grounded => self.movement_plane_normal(),
            LocomotionState::Airborne => up,
        };
        let launch_speed = spec.launch_speed(gravity.length());

        let velocity = body.velocity();
        // In-plane velocity is dropped once the launch surface reaches
        // min_slope_angle; below it the momentum carries into the jump
        let plane_velocity = if angle_deg(jump_normal, up) >= self.config.slopes.min_slope_angle {
            project_on_plane(velocity, jump_normal)
        } else {
            Vec3::ZERO
        };
        let aligned_velocity = project(velocity, jump_normal);
        body.set_velocity(velocity + jump_normal * launch_speed - plane_velocity - aligned_velocity);

        self.takeoff_speed = project_on_plane(velocity, gravity)
            .length()
            .min(self.air_movement().max_speed);

        let time_to_apex = launch_speed / gravity.length();
        self.animator.start_squash(curve, time_to_apex, jump_normal);
        self.emit(BallEvent::Jumped { index });
        debug!(index, launch_speed, takeoff_speed = self.takeoff_speed, "Jump applied");
    }

    /// Clamp the falling part of `velocity` to the terminal fall speed
    fn cap_fall_speed(&self, velocity: Vec3) -> Vec3 {
        let down = self.gravity().normalize_or_zero();
        let falling = velocity.dot(down);
        if falling > self.config.fall_speed_cap {
            velocity - down * (falling - self.config.fall_speed_cap)
        } else {
            velocity
        }
    }

    /// Turning multiplier: the profile's factor when steering against the
    /// current velocity, 1 otherwise
    fn turning(&mut self, desired: Vec3, plane_velocity: Vec3, turning_factor: f32) -> f32 {
        if desired.dot(plane_velocity) >= 0.0 {
            1.0
        } else {
            self.emit(BallEvent::Turning);
            turning_factor
        }
    }

    fn spin_on_ground(&mut self, desired: Vec3, plane_velocity: Vec3, steer: Steering, up: Vec3) {
        let gravity_magnitude = self.gravity().length();
        self.animator.spin_grounded(
            desired,
            plane_velocity,
            steer.max_speed,
            steer.acceleration,
            steer.turning,
            self.config.turning_squash,
            up,
            gravity_magnitude,
            self.config.fixed_timestep,
        );
    }

    fn spin_free(&mut self, desired: Vec3, steer: Steering, up: Vec3) {
        let ground = self.ground_movement();
        let gravity_magnitude = self.gravity().length();
        self.animator.spin_free(
            desired,
            ground.max_speed,
            ground.acceleration(),
            steer.deceleration,
            up,
            gravity_magnitude,
            self.config.fixed_timestep,
        );
    }
}
