//! Dash sequencing
//!
//! A dash is a short fixed-step task: a few frozen frames of anticipation,
//! then a straight burst at constant speed. Once the whole chain has been
//! used it recharges either on landing or after a cooldown.

use glam::Vec3;
use rollerball_core::math::{is_zero, project_on_plane};
use rollerball_core::time::steps_for;
use rollerball_core::AnimationCurve;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::profile::is_positive;

/// Parameters of one dash in a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashSpec {
    /// Burst speed (m/s)
    pub dash_speed: f32,
    /// Burst length in seconds
    pub dash_duration: f32,
    /// Fixed steps the ball hangs still before the burst
    pub dash_freeze_frames: u32,
    /// Aim along the input direction instead of the current velocity
    pub can_change_direction: bool,
    /// Stretch along the dash direction, keyed over twice the burst length
    pub animation_curve: AnimationCurve,
}

impl Default for DashSpec {
    fn default() -> Self {
        Self {
            dash_speed: 14.0,
            dash_duration: 0.15,
            dash_freeze_frames: 3,
            can_change_direction: true,
            animation_curve: AnimationCurve::default(),
        }
    }
}

impl DashSpec {
    pub fn validate(&self, index: usize, fixed_timestep: f32) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidDash {
            index,
            reason: reason.to_string(),
        };

        if !is_positive(self.dash_speed) {
            return Err(invalid("dash_speed must be positive"));
        }
        if !is_positive(self.dash_duration) {
            return Err(invalid("dash_duration must be positive"));
        }
        if steps_for(self.dash_duration, fixed_timestep) == 0 {
            return Err(invalid("dash_duration is shorter than one fixed step"));
        }
        self.animation_curve.validate()?;
        Ok(())
    }
}

/// When a spent dash chain becomes available again
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashRecharge {
    /// Recharge on the next landing
    OnGround,
    /// Recharge after a fixed delay
    Cooldown { seconds: f32 },
}

impl Default for DashRecharge {
    fn default() -> Self {
        Self::Cooldown { seconds: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DashPhase {
    Idle,
    /// Requested this frame, direction resolved on the next fixed step
    Pending {
        index: usize,
        desired: Vec3,
        fallback: Vec3,
    },
    Freeze {
        index: usize,
        direction: Vec3,
        remaining: u32,
        burst_steps: u32,
    },
    Burst {
        index: usize,
        direction: Vec3,
        remaining: u32,
        started: bool,
    },
    /// Chain spent, waiting for ground or for the cooldown to run out
    Recharging { remaining: Option<u32> },
}

/// What the dash wants from the ball on one fixed step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashStep {
    /// A dash began this step (index into the chain)
    pub started: Option<usize>,
    /// The burst began this step, along this direction and lasting this long
    pub burst: Option<(usize, Vec3, f32)>,
    /// Velocity to force this step, with gravity cancelled
    pub velocity: Option<Vec3>,
    /// Direction of the active dash, if any
    pub direction: Option<Vec3>,
    /// The chain was restored this step
    pub recharged: bool,
}

/// Dash state of one ball
#[derive(Debug, Clone)]
pub struct DashController {
    count: usize,
    phase: DashPhase,
}

impl Default for DashController {
    fn default() -> Self {
        Self {
            count: 0,
            phase: DashPhase::Idle,
        }
    }
}

impl DashController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dashes used in the current chain
    pub fn count(&self) -> usize {
        self.count
    }

    /// Pending, frozen or bursting
    pub fn is_dashing(&self) -> bool {
        matches!(
            self.phase,
            DashPhase::Pending { .. } | DashPhase::Freeze { .. } | DashPhase::Burst { .. }
        )
    }

    pub fn is_recharging(&self) -> bool {
        matches!(self.phase, DashPhase::Recharging { .. })
    }

    /// Start a dash if a charge is left and none is running.
    ///
    /// The direction is locked in on the next fixed step.
    pub fn request(&mut self, desired: Vec3, fallback: Vec3, available: usize) -> bool {
        if self.count >= available || self.is_dashing() || self.is_recharging() {
            return false;
        }

        self.phase = DashPhase::Pending {
            index: self.count,
            desired,
            fallback,
        };
        self.count += 1;
        true
    }

    /// Restore a partly used chain on landing
    pub fn land(&mut self) {
        if !self.is_dashing() && !self.is_recharging() {
            self.count = 0;
        }
    }

    /// Advance the sequence by one fixed step
    pub fn step(
        &mut self,
        velocity: Vec3,
        up: Vec3,
        grounded: bool,
        specs: &[DashSpec],
        recharge: DashRecharge,
        dt: f32,
    ) -> DashStep {
        let mut out = DashStep::default();

        if let DashPhase::Pending {
            index,
            desired,
            fallback,
        } = self.phase
        {
            let Some(spec) = specs.get(index) else {
                self.phase = DashPhase::Idle;
                return out;
            };
            let direction = dash_direction(spec, desired, fallback, velocity, up);
            let burst_steps = steps_for(spec.dash_duration, dt).max(1);
            out.started = Some(index);
            debug!(index, ?direction, "Dash started");

            self.phase = if spec.dash_freeze_frames > 0 {
                DashPhase::Freeze {
                    index,
                    direction,
                    remaining: spec.dash_freeze_frames,
                    burst_steps,
                }
            } else {
                DashPhase::Burst {
                    index,
                    direction,
                    remaining: burst_steps,
                    started: false,
                }
            };
        }

        match self.phase {
            DashPhase::Idle | DashPhase::Pending { .. } => {}
            DashPhase::Freeze {
                index,
                direction,
                remaining,
                burst_steps,
            } => {
                out.velocity = Some(Vec3::ZERO);
                out.direction = Some(direction);
                self.phase = if remaining > 1 {
                    DashPhase::Freeze {
                        index,
                        direction,
                        remaining: remaining - 1,
                        burst_steps,
                    }
                } else {
                    DashPhase::Burst {
                        index,
                        direction,
                        remaining: burst_steps,
                        started: false,
                    }
                };
            }
            DashPhase::Burst {
                index,
                direction,
                remaining,
                started,
            } => {
                let speed = specs.get(index).map_or(0.0, |spec| spec.dash_speed);
                if !started {
                    let duration = specs.get(index).map_or(0.0, |spec| spec.dash_duration);
                    out.burst = Some((index, direction, duration));
                }
                out.velocity = Some(direction * speed);
                out.direction = Some(direction);

                self.phase = if remaining > 1 {
                    DashPhase::Burst {
                        index,
                        direction,
                        remaining: remaining - 1,
                        started: true,
                    }
                } else if self.count >= specs.len() {
                    let remaining = match recharge {
                        DashRecharge::OnGround => None,
                        DashRecharge::Cooldown { seconds } => Some(steps_for(seconds, dt)),
                    };
                    DashPhase::Recharging { remaining }
                } else {
                    DashPhase::Idle
                };
            }
            DashPhase::Recharging { remaining } => {
                let done = match remaining {
                    None => grounded,
                    Some(0) => true,
                    Some(left) => {
                        self.phase = DashPhase::Recharging {
                            remaining: Some(left - 1),
                        };
                        left == 1
                    }
                };
                if done {
                    self.count = 0;
                    self.phase = DashPhase::Idle;
                    out.recharged = true;
                    debug!("Dash recharged");
                }
            }
        }

        out
    }

    /// Abort any running dash without restoring its charge
    pub fn cancel(&mut self) {
        if self.is_dashing() {
            self.phase = DashPhase::Idle;
        }
    }
}

/// Lock the dash direction: input (or camera forward) for steerable dashes,
/// otherwise the current velocity along the ground plane (or camera forward)
fn dash_direction(spec: &DashSpec, desired: Vec3, fallback: Vec3, velocity: Vec3, up: Vec3) -> Vec3 {
    let preferred = if spec.can_change_direction {
        desired
    } else {
        project_on_plane(velocity, up)
    };
    let direction = if is_zero(preferred) { fallback } else { preferred };
    direction.normalize_or_zero()
}
