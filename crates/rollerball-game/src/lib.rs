//! RollerBall Game - Movement controller for a physics-driven rolling ball
//!
//! Provides ground classification, the Grounded/Airborne state machine,
//! velocity integration, jumps, dashes and the cosmetic spin/squash animator.

pub mod animator;
pub mod ball;
pub mod config;
pub mod control;
pub mod dash;
pub mod events;
pub mod ground;
pub mod jump;
pub mod profile;

pub use animator::{CosmeticAnimator, SquashStretch};
pub use ball::{ActiveProfile, BallSnapshot, LocomotionState, RollerBall};
pub use config::{ConfigError, DashConfig, RollerBallConfig, SlopeConfig, SlopeMode};
pub use control::{BallAction, BallControl, CameraBasis, ControlMode, ControlState};
pub use dash::{DashController, DashRecharge, DashSpec};
pub use events::BallEvent;
pub use ground::{GroundClassifier, GroundContact, GroundTilt, SlopeBand};
pub use jump::{JumpController, JumpRequest, JumpSpec};
pub use profile::{AccelerationRates, MovementProfile};
