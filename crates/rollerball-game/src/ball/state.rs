//! Locomotion state and the read-only snapshot exposed to hosts

use std::fmt;

use glam::Vec3;
use rollerball_core::Transform;
use serde::{Deserialize, Serialize};

use crate::ground::GroundTilt;

/// Top-level locomotion state. Dashing is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocomotionState {
    Grounded,
    Airborne,
}

impl fmt::Display for LocomotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grounded => write!(f, "Grounded"),
            Self::Airborne => write!(f, "Airborne"),
        }
    }
}

/// Per-tick view of a ball for UI and logging
#[derive(Debug, Clone, Serialize)]
pub struct BallSnapshot {
    /// Fixed steps taken since the ball was created
    pub tick: u64,
    pub state: LocomotionState,
    /// Tilt of the ground under the ball, `None` while airborne
    pub tilt: Option<GroundTilt>,
    /// Speed along the movement plane
    pub speed: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit ground normal or zero
    pub ground_normal: Vec3,
    pub jump_count: usize,
    pub dash_count: usize,
    pub is_dashing: bool,
    /// Where to place contact effects, relative to the ball center
    pub contact_marker: Transform,
    pub collider_radius: f32,
}

impl fmt::Display for BallSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State: {}", self.state)?;
        match self.tilt {
            Some(tilt) => write!(f, " | Tilt: {tilt:?}")?,
            None => write!(f, " | Tilt: -")?,
        }
        write!(f, " | Speed: {:.2}", self.speed)?;
        if self.is_dashing {
            write!(f, " | Dashing")?;
        }
        Ok(())
    }
}
