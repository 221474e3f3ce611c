//! The rolling ball
//!
//! Ties the ground classifier, jump and dash controllers and the cosmetic
//! animator together into a two-state (grounded/airborne) controller driven
//! once per fixed step.

mod controller;
mod movement;
mod state;

pub use controller::{ActiveProfile, RollerBall};
pub use state::{BallSnapshot, LocomotionState};
