//! RollerBall Core - Shared math, time and curve types
//!
//! This crate provides the foundational types used by the physics adapter and
//! the ball controller:
//! - Vector helpers (plane projection, move-towards, angle measurement)
//! - Transform component for the visual model
//! - Fixed-step clock driving the simulation
//! - Piecewise-linear animation curves for squash-and-stretch

pub mod curve;
pub mod math;
pub mod time;
pub mod types;

pub use curve::{AnimationCurve, CurveError, Keyframe};
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use time::FixedClock;
pub use types::Transform;
