//! Jump bookkeeping
//!
//! Tracks jump charges, the coyote window, buffered presses and the
//! early-release cut-off. Velocity changes themselves happen in the ball's
//! fixed-step pass; this module only decides *whether* and *how hard*.

use glam::Vec3;
use rollerball_core::math::{clamp_magnitude, is_zero, project};
use rollerball_core::AnimationCurve;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::profile::is_positive;

/// Parameters of one jump in a multi-jump chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpSpec {
    /// Apex height above the takeoff point (m)
    pub jump_height: f32,
    /// Fraction of gravity felt while rising; lower is floatier
    pub gravity_damp_on_rise: f32,
    /// Gravity multiplier applied after the jump button is released early
    pub jump_cut_off_factor: f32,
    /// Squash-and-stretch along the jump normal, keyed over time-to-apex
    pub animation_curve: AnimationCurve,
}

impl Default for JumpSpec {
    fn default() -> Self {
        Self {
            jump_height: 2.0,
            gravity_damp_on_rise: 0.8,
            jump_cut_off_factor: 2.5,
            animation_curve: AnimationCurve::default(),
        }
    }
}

impl JumpSpec {
    /// Launch speed along the jump normal
    pub fn launch_speed(&self, gravity_magnitude: f32) -> f32 {
        (2.0 * self.jump_height * gravity_magnitude * self.gravity_damp_on_rise).sqrt()
    }

    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidJump {
            index,
            reason: reason.to_string(),
        };

        if !is_positive(self.jump_height) {
            return Err(invalid("jump_height must be positive"));
        }
        if !is_positive(self.gravity_damp_on_rise) || self.gravity_damp_on_rise > 1.0 {
            return Err(invalid("gravity_damp_on_rise must be in (0, 1]"));
        }
        if !self.jump_cut_off_factor.is_finite() || self.jump_cut_off_factor < 1.0 {
            return Err(invalid("jump_cut_off_factor must be at least 1"));
        }
        self.animation_curve.validate()?;
        Ok(())
    }
}

/// Outcome of a jump press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRequest {
    /// The jump fires on the next fixed step
    Accepted,
    /// Out of charges; the press waits for landing
    Buffered,
    /// Refused: the coyote window has passed, or out of charges with no buffer
    Ignored,
}

/// Where the ball is when a jump is requested
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpContext {
    Grounded,
    /// Airborne for this many seconds
    Airborne { time_in_air: f64 },
}

/// Jump state of one ball
#[derive(Debug, Clone, Default)]
pub struct JumpController {
    /// Jumps used since the last landing
    count: usize,
    /// A jump fires on the next fixed step
    should_jump: bool,
    /// The button was released while rising
    should_dampen: bool,
    /// A release arrived and awaits evaluation against the next step's velocity
    cut_off_requested: bool,
    /// Extra acceleration applied while `should_dampen` is latched
    cut_off_acceleration: Vec3,
    /// Remaining fixed steps of a buffered press
    buffered_steps: Option<u32>,
}

impl JumpController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jumps used since the last landing
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn should_jump(&self) -> bool {
        self.should_jump
    }

    pub fn should_dampen(&self) -> bool {
        self.should_dampen
    }

    pub fn cut_off_acceleration(&self) -> Vec3 {
        self.cut_off_acceleration
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered_steps.is_some()
    }

    /// Restore every charge (on landing)
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Handle a jump press.
    ///
    /// `buffer_steps` is the buffer window converted to fixed steps.
    pub fn request(
        &mut self,
        context: JumpContext,
        coyote_time: f32,
        buffer_steps: u32,
        available: usize,
    ) -> JumpRequest {
        let allowed = match context {
            JumpContext::Grounded => self.count < available,
            JumpContext::Airborne { time_in_air } => {
                let coyote = self.count == 0 && time_in_air <= coyote_time as f64;
                let chained = self.count > 0 && self.count < available;
                (coyote && available > 0) || chained
            }
        };

        if allowed {
            self.should_jump = true;
            self.should_dampen = false;
            self.buffered_steps = None;
            JumpRequest::Accepted
        } else if context != JumpContext::Grounded && self.count >= available && buffer_steps > 0 {
            self.buffered_steps = Some(buffer_steps);
            JumpRequest::Buffered
        } else {
            JumpRequest::Ignored
        }
    }

    /// Advance a buffered press by one fixed step. Returns true when it fires.
    pub fn poll_buffer(&mut self, grounded: bool, available: usize) -> bool {
        let Some(remaining) = self.buffered_steps else {
            return false;
        };

        if grounded && self.count < available {
            self.buffered_steps = None;
            self.should_jump = true;
            self.should_dampen = false;
            return true;
        }

        self.buffered_steps = remaining.checked_sub(1).filter(|&left| left > 0);
        false
    }

    /// Take the pending jump. Returns the index of the spec to launch with and
    /// spends a charge, or `None` when nothing is pending or no charge is left.
    pub fn consume(&mut self, available: usize) -> Option<usize> {
        if !std::mem::take(&mut self.should_jump) {
            return None;
        }
        if self.count >= available {
            return None;
        }
        let index = self.count;
        self.count += 1;
        Some(index)
    }

    /// Note a button release; evaluated on the next fixed step
    pub fn request_cut_off(&mut self) {
        self.cut_off_requested = true;
    }

    /// Take a pending release
    pub fn take_cut_off_request(&mut self) -> bool {
        std::mem::take(&mut self.cut_off_requested)
    }

    /// Latch the early-release deceleration if the ball is still rising.
    ///
    /// The extra gravity is clamped so one step cannot remove more than the
    /// current rising speed.
    pub fn evaluate_cut_off(&mut self, velocity: Vec3, gravity: Vec3, dt: f32, specs: &[JumpSpec]) {
        if specs.is_empty() || velocity.dot(gravity) >= 0.0 {
            return;
        }

        let rising = project(velocity, gravity);
        let index = self.count.clamp(1, specs.len()) - 1;
        let factor = specs[index].jump_cut_off_factor;

        let boosted = clamp_magnitude(gravity * factor, rising.length() / dt);
        let cut_off = boosted - gravity;

        self.should_dampen = true;
        self.cut_off_acceleration = if cut_off.dot(gravity) < 0.0 {
            Vec3::ZERO
        } else {
            cut_off
        };
    }

    /// Extra acceleration while rising after a jump.
    ///
    /// Applies the cut-off once released, otherwise the spec's rise damping.
    /// Clears the release latch as soon as the ball stops rising.
    pub fn rise_acceleration(&mut self, velocity: Vec3, up: Vec3, gravity: Vec3, specs: &[JumpSpec]) -> Vec3 {
        if is_zero(up) || velocity.dot(up) <= 0.0 {
            self.should_dampen = false;
            return Vec3::ZERO;
        }

        if self.should_dampen {
            return self.cut_off_acceleration;
        }

        match self.count.checked_sub(1).and_then(|index| specs.get(index)) {
            Some(spec) => -gravity * (1.0 - spec.gravity_damp_on_rise),
            None => Vec3::ZERO,
        }
    }

    /// Drop pending requests (entity teardown)
    pub fn cancel(&mut self) {
        self.should_jump = false;
        self.cut_off_requested = false;
        self.buffered_steps = None;
    }
}
