//! Ball controller: contact handling, state machine and requests

use glam::{Mat4, Quat, Vec3};
use rollerball_core::math::{angle_deg, is_zero, project_on_plane, rotate_onto_plane};
use rollerball_core::time::steps_for;
use rollerball_core::{FixedClock, Transform};
use rollerball_physics::{BallBody, ContactPoint, ForceMode, SurfaceId};
use tracing::{debug, info, warn};

use super::state::{BallSnapshot, LocomotionState};
use crate::animator::CosmeticAnimator;
use crate::config::{ConfigError, RollerBallConfig};
use crate::dash::{DashController, DashRecharge};
use crate::events::BallEvent;
use crate::ground::{band_for_angle, GroundClassifier, GroundTilt};
use crate::jump::{JumpContext, JumpController, JumpRequest};
use crate::profile::MovementProfile;

/// Share of the spin energy kept when bumping into a wall
const MOMENTUM_SHIFT_RATIO: f32 = 2.0 / 5.0;

/// Which configured profile the state machine selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveProfile {
    Ground,
    Air,
    /// Index into the manual slope bands
    SlopeBand(usize),
}

/// A physics-driven rolling ball.
///
/// The ball owns its movement state but not its rigid body: every fixed step
/// the host passes the body in through [`RollerBall::fixed_update`]. Input
/// edges (`try_jump`, `evaluate_jump_cut_off`, `try_dash`) only record
/// requests; velocities are only ever written inside the fixed step.
#[derive(Debug, Clone)]
pub struct RollerBall {
    pub(super) config: RollerBallConfig,
    pub(super) classifier: GroundClassifier,
    pub(super) clock: FixedClock,

    pub(super) state: LocomotionState,
    /// Clock time at which the current state was entered
    state_entered_at: f64,
    pub(super) tilt: GroundTilt,
    active_profile: ActiveProfile,
    ground_override: Option<MovementProfile>,
    air_override: Option<MovementProfile>,
    gravity_override: Option<Vec3>,

    ground_normal: Vec3,
    previous_ground_normal: Vec3,
    pub(super) overslope_normal: Vec3,
    /// Surfaces touched on the previous step
    touching: Vec<SurfaceId>,

    pub(super) takeoff_speed: f32,
    pub(super) auto_slope_modifier: f32,

    pub(super) jump: JumpController,
    pub(super) dash: DashController,
    pub(super) animator: CosmeticAnimator,
    events: Vec<BallEvent>,

    position: Vec3,
    velocity: Vec3,
}

impl RollerBall {
    /// Build a ball from a configuration, validating it first
    pub fn new(mut config: RollerBallConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let classifier =
            GroundClassifier::new(config.slopes.min_slope_angle, config.slopes.max_slope_angle);
        let clock = FixedClock::with_timestep(config.fixed_timestep);
        let animator = CosmeticAnimator::new(config.sphere_radius);
        let up = -config.gravity.normalize_or_zero();

        info!(
            jumps = config.jumps.len(),
            dashes = config.dash.dashes.len(),
            "Ball created"
        );

        Ok(Self {
            config,
            classifier,
            clock,
            state: LocomotionState::Grounded,
            state_entered_at: 0.0,
            tilt: GroundTilt::Flat,
            active_profile: ActiveProfile::Ground,
            ground_override: None,
            air_override: None,
            gravity_override: None,
            ground_normal: up,
            previous_ground_normal: up,
            overslope_normal: Vec3::ZERO,
            touching: Vec::new(),
            takeoff_speed: 0.0,
            auto_slope_modifier: 1.0,
            jump: JumpController::new(),
            dash: DashController::new(),
            animator,
            events: Vec::new(),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
        })
    }

    pub fn config(&self) -> &RollerBallConfig {
        &self.config
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    pub fn tilt(&self) -> GroundTilt {
        self.tilt
    }

    /// Unit normal of this step's ground contact, or zero
    pub fn ground_normal(&self) -> Vec3 {
        self.ground_normal
    }

    pub fn jump_count(&self) -> usize {
        self.jump.count()
    }

    pub fn dash_count(&self) -> usize {
        self.dash.count()
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.is_dashing()
    }

    pub fn should_jump(&self) -> bool {
        self.jump.should_jump()
    }

    /// Horizontal speed at the last takeoff
    pub fn takeoff_speed(&self) -> f32 {
        self.takeoff_speed
    }

    pub fn active_profile(&self) -> ActiveProfile {
        self.active_profile
    }

    /// Control factor applied on the last grounded step
    pub fn auto_slope_modifier(&self) -> f32 {
        self.auto_slope_modifier
    }

    pub fn animator(&self) -> &CosmeticAnimator {
        &self.animator
    }

    /// Gravity acting on this ball
    pub fn gravity(&self) -> Vec3 {
        self.gravity_override.unwrap_or(self.config.gravity)
    }

    /// Unit vector opposite to gravity
    pub fn up(&self) -> Vec3 {
        -self.gravity().normalize_or_zero()
    }

    /// The more upright of this step's and the previous step's ground
    /// normal. Covers a contact report that is momentarily empty or that
    /// only holds the far side of a crease. Ties go to this step's normal.
    pub fn effective_ground_normal(&self) -> Vec3 {
        let up = self.up();
        if self.ground_normal.dot(up) >= self.previous_ground_normal.dot(up) {
            self.ground_normal
        } else {
            self.previous_ground_normal
        }
    }

    /// Plane the grounded integrator steers in
    pub fn movement_plane_normal(&self) -> Vec3 {
        let normal = self.effective_ground_normal();
        if is_zero(normal) {
            self.up()
        } else {
            normal
        }
    }

    /// Profile steering the ball right now, overrides included
    pub fn movement_profile(&self) -> MovementProfile {
        let overridden = match self.state {
            LocomotionState::Grounded => self.ground_override,
            LocomotionState::Airborne => self.air_override,
        };
        if let Some(profile) = overridden {
            return profile;
        }

        match self.active_profile {
            ActiveProfile::Ground => self.config.ground,
            ActiveProfile::Air => self.config.air,
            ActiveProfile::SlopeBand(index) => self
                .config
                .slopes
                .bands()
                .get(index)
                .map_or(self.config.ground, |band| band.profile),
        }
    }

    /// Flat-ground profile, override included
    pub(super) fn ground_movement(&self) -> MovementProfile {
        self.ground_override.unwrap_or(self.config.ground)
    }

    /// Air profile, override included
    pub(super) fn air_movement(&self) -> MovementProfile {
        self.air_override.unwrap_or(self.config.air)
    }

    /// Replace the grounded profile until cleared with `None`
    pub fn set_ground_movement_override(
        &mut self,
        profile: Option<MovementProfile>,
    ) -> Result<(), ConfigError> {
        if let Some(profile) = &profile {
            profile.validate("ground override")?;
        }
        self.ground_override = profile;
        Ok(())
    }

    /// Replace the airborne profile until cleared with `None`
    pub fn set_air_movement_override(
        &mut self,
        profile: Option<MovementProfile>,
    ) -> Result<(), ConfigError> {
        if let Some(profile) = &profile {
            profile.validate("air override")?;
        }
        self.air_override = profile;
        Ok(())
    }

    /// Give this ball its own gravity (antigravity floors); `None` restores
    /// the configured gravity
    pub fn set_gravity_override(&mut self, gravity: Option<Vec3>) -> Result<(), ConfigError> {
        if let Some(gravity) = gravity {
            if !gravity.is_finite() || is_zero(gravity) {
                return Err(ConfigError::Invalid {
                    field: "gravity override",
                    reason: "must be a finite, non-zero vector".to_string(),
                });
            }
        }
        debug!(?gravity, "Gravity override set");
        self.gravity_override = gravity;
        Ok(())
    }

    /// Advance the ball by one fixed step.
    ///
    /// Reads the contacts, runs the state machine and the active integrator,
    /// then queues this ball's gravity on the body. The host steps its
    /// physics afterwards.
    pub fn fixed_update<B: BallBody + ?Sized>(&mut self, body: &mut B, desired: Vec3) {
        let dt = self.config.fixed_timestep;
        self.clock.tick();
        self.velocity = body.velocity();

        self.update_contacts(body);

        let grounded = self.state == LocomotionState::Grounded;
        if self.jump.poll_buffer(grounded, self.config.jumps.len()) {
            debug!("Buffered jump released on landing");
        }
        if self.jump.take_cut_off_request() {
            self.jump
                .evaluate_cut_off(body.velocity(), self.gravity(), dt, &self.config.jumps);
        }

        let gravity = self.gravity();
        let up = self.up();
        let dash = self.dash.step(
            body.velocity(),
            up,
            grounded,
            &self.config.dash.dashes,
            self.config.dash.recharge,
            dt,
        );
        if let Some(index) = dash.started {
            self.animator.cancel_squash();
            let direction = dash.direction.unwrap_or(Vec3::ZERO);
            self.emit(BallEvent::Dashed { index, direction });
        }
        if let Some((index, direction, duration)) = dash.burst {
            if let Some(spec) = self.config.dash.dashes.get(index) {
                self.animator
                    .start_squash(spec.animation_curve.clone(), duration * 2.0, direction);
            }
        }
        if dash.recharged {
            self.emit(BallEvent::DashRecharged);
        }

        match dash.velocity {
            Some(velocity) => {
                body.set_velocity(velocity);
                body.add_force(-gravity, ForceMode::Acceleration);
                let ground = self.ground_movement();
                self.animator.spin_free(
                    dash.direction.unwrap_or(Vec3::ZERO),
                    ground.max_speed,
                    ground.acceleration(),
                    ground.deceleration(),
                    up,
                    gravity.length(),
                    dt,
                );
            }
            None => match self.state {
                LocomotionState::Grounded => self.grounded_move(body, desired),
                LocomotionState::Airborne => self.airborne_move(body, desired),
            },
        }

        body.add_force(gravity, ForceMode::Acceleration);
        self.animator.tick(dt);
        body.set_collider_radius(self.animator.collider_radius());

        self.position = body.position();
        self.velocity = body.velocity();
    }

    /// Classify this step's contacts and drive the state transitions
    fn update_contacts<B: BallBody + ?Sized>(&mut self, body: &mut B) {
        let contacts = body.contacts();
        let up = self.up();

        self.previous_ground_normal = self.ground_normal;
        let ground = self.classifier.classify(&contacts, up);
        self.ground_normal = ground.normal;
        self.overslope_normal = ground.overslope;

        if contacts.is_empty() {
            self.touching.clear();
            self.switch_state(LocomotionState::Airborne);
            return;
        }

        match self.state {
            LocomotionState::Grounded => {
                if is_zero(self.ground_normal) {
                    self.probe_ground(body, up);
                }
                if is_zero(self.ground_normal) && is_zero(self.previous_ground_normal) {
                    self.switch_state(LocomotionState::Airborne);
                } else {
                    self.update_ground_tilt();
                    if self.config.shift_momentum_on_collision {
                        self.shift_momentum(body, &contacts);
                    }
                }
            }
            LocomotionState::Airborne => {
                if !is_zero(self.ground_normal) {
                    self.switch_state(LocomotionState::Grounded);
                }
            }
        }

        self.touching = contacts.iter().map(|contact| contact.surface).collect();
    }

    /// Look for walkable ground straight below when contacts offered none
    fn probe_ground<B: BallBody + ?Sized>(&mut self, body: &B, up: Vec3) {
        let Some(distance) = self.config.ground_probe_distance else {
            return;
        };
        let reach = self.config.sphere_radius + distance;
        let Some(hit) = body.probe(body.position(), -up, reach) else {
            return;
        };
        let Some(normal) = hit.normal.try_normalize() else {
            return;
        };
        if self.classifier.tilt(normal, up).is_some() {
            debug!(?normal, "Ground found by probe");
            self.ground_normal = normal;
        }
    }

    /// Keep rolling when bumping into a wall: if the impact would eat most of
    /// the speed, redirect along the wall with a share of the spin
    fn shift_momentum<B: BallBody + ?Sized>(&mut self, body: &mut B, contacts: &[ContactPoint]) {
        let Some(entering) = contacts
            .iter()
            .find(|contact| !self.touching.contains(&contact.surface))
        else {
            return;
        };
        let Some(normal) = entering.normal.try_normalize() else {
            return;
        };
        if normal.abs_diff_eq(self.effective_ground_normal(), 1e-4) {
            return;
        }

        let spin = self.animator.spin_velocity();
        let min_speed_sq = MOMENTUM_SHIFT_RATIO * spin.length_squared();
        let along_wall = project_on_plane(body.velocity(), normal);

        if along_wall.length_squared() < min_speed_sq {
            let direction = rotate_onto_plane(spin, self.up(), normal).normalize_or_zero();
            body.set_velocity(direction * min_speed_sq.sqrt());
            debug!(?normal, "Momentum shifted on impact");
        }
    }

    /// Reclassify the ground tilt and pick the matching profile
    fn update_ground_tilt(&mut self) {
        let normal = self.effective_ground_normal();
        if is_zero(normal) {
            return;
        }

        let angle = angle_deg(normal, self.up());
        match self.classifier.tilt_for_angle(angle) {
            Some(tilt) => self.switch_ground_tilt(tilt, angle),
            None => self.ground_normal = Vec3::ZERO,
        }
    }

    fn switch_ground_tilt(&mut self, tilt: GroundTilt, angle: f32) {
        if tilt != self.tilt {
            debug!(?tilt, angle, "Ground tilt changed");
        }
        self.tilt = tilt;

        self.active_profile = match tilt {
            GroundTilt::Slope if !self.config.slopes.is_auto() => {
                band_for_angle(self.config.slopes.bands(), angle)
                    .map_or(ActiveProfile::Ground, ActiveProfile::SlopeBand)
            }
            _ => ActiveProfile::Ground,
        };
    }

    /// Move to `new_state`, running exit and enter actions.
    ///
    /// Switching to the current state does nothing.
    pub fn switch_state(&mut self, new_state: LocomotionState) {
        if self.state == new_state {
            return;
        }

        let previous = self.state;
        if previous == LocomotionState::Airborne {
            self.emit(BallEvent::Landed);
        }

        self.state = new_state;
        self.state_entered_at = self.clock.elapsed();

        match new_state {
            LocomotionState::Grounded => {
                self.update_ground_tilt();
                self.jump.reset();
                if self.config.dash.recharge == DashRecharge::OnGround {
                    self.dash.land();
                }
            }
            LocomotionState::Airborne => {
                self.active_profile = ActiveProfile::Air;
                if self.jump.count() == 0 {
                    // Walked off a ledge: the air speed cap starts from the current speed
                    self.takeoff_speed = project_on_plane(self.velocity, self.gravity())
                        .length()
                        .min(self.air_movement().max_speed);
                }
            }
        }

        debug!(from = %previous, to = %new_state, "Ball state changed");
        self.emit(BallEvent::StateChanged {
            from: previous,
            to: new_state,
        });
    }

    /// Request a jump (jump button pressed)
    pub fn try_jump(&mut self) -> JumpRequest {
        let context = match self.state {
            LocomotionState::Grounded => JumpContext::Grounded,
            LocomotionState::Airborne => JumpContext::Airborne {
                time_in_air: self.clock.since(self.state_entered_at),
            },
        };
        let buffer_steps = steps_for(self.config.input_buffer, self.config.fixed_timestep);

        let request = self.jump.request(
            context,
            self.config.coyote_time,
            buffer_steps,
            self.config.jumps.len(),
        );
        debug!(?request, jump_count = self.jump.count(), "Jump requested");
        request
    }

    /// Jump button released: cut the jump short if still rising
    pub fn evaluate_jump_cut_off(&mut self) {
        self.jump.request_cut_off();
    }

    /// Request a dash along `desired`, or along `fallback` when there is no
    /// input. Only allowed in the air.
    pub fn try_dash(&mut self, desired: Vec3, fallback: Vec3) -> bool {
        if self.state != LocomotionState::Airborne {
            debug!("Dash refused on the ground");
            return false;
        }

        let accepted = self
            .dash
            .request(desired, fallback, self.config.dash.dashes.len());
        if !accepted {
            debug!(dash_count = self.dash.count(), "Dash refused");
        }
        accepted
    }

    /// Cancel every running task and restore the collider (entity teardown)
    pub fn cancel_tasks<B: BallBody + ?Sized>(&mut self, body: &mut B) {
        self.jump.cancel();
        self.dash.cancel();
        self.animator.cancel_all();
        body.set_collider_radius(self.config.sphere_radius);
    }

    pub(super) fn emit(&mut self, event: BallEvent) {
        if event == BallEvent::Turning && self.events.contains(&BallEvent::Turning) {
            return;
        }
        self.events.push(event);
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<BallEvent> {
        std::mem::take(&mut self.events)
    }

    /// World matrix of the visual model
    pub fn visual_matrix(&self) -> Mat4 {
        self.animator.visual_matrix(self.position)
    }

    /// Read-only view for UI and logging
    pub fn snapshot(&self) -> BallSnapshot {
        let normal = self.effective_ground_normal();
        let marker_rotation = if is_zero(normal) {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Y, normal)
        };
        let marker_offset =
            -normal * self.config.sphere_radius * self.animator.turning_scale();

        BallSnapshot {
            tick: self.clock.ticks(),
            state: self.state,
            tilt: (self.state == LocomotionState::Grounded).then_some(self.tilt),
            speed: project_on_plane(self.velocity, self.movement_plane_normal()).length(),
            position: self.position,
            velocity: self.velocity,
            ground_normal: self.ground_normal,
            jump_count: self.jump.count(),
            dash_count: self.dash.count(),
            is_dashing: self.dash.is_dashing(),
            contact_marker: Transform::from_position_rotation(marker_offset, marker_rotation),
            collider_radius: self.animator.collider_radius(),
        }
    }

    /// Replace a non-finite input direction with zero
    pub(super) fn sanitize_direction(&self, desired: Vec3) -> Vec3 {
        if desired.is_finite() {
            desired
        } else {
            warn!(?desired, "Ignoring non-finite input direction");
            Vec3::ZERO
        }
    }
}
