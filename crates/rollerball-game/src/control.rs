//! Player control layer
//!
//! Turns a frame of action input plus the camera basis into ball requests.
//! Button edges are forwarded as they happen; the movement direction is
//! resolved here and handed to [`RollerBall::fixed_update`] by the host.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use rollerball_core::math::{is_zero, project_on_plane};
use serde::{Deserialize, Serialize};

use crate::ball::{LocomotionState, RollerBall};

/// How stick input maps onto the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Full 3D movement relative to the camera
    #[default]
    ThreeD,
    /// Horizontal stick axis only, along the camera's right
    SideScroller,
    /// Both axes, with the camera's up as forward (camera looking down)
    TopDown,
}

impl ControlMode {
    /// Whether dashes without input reuse the last movement direction
    /// instead of the camera forward
    pub fn is_planar(self) -> bool {
        !matches!(self, Self::ThreeD)
    }
}

/// Ball actions bound to buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallAction {
    Jump,
    Dash,
}

/// Input for one frame
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// Actions currently held down
    pub held: HashSet<BallAction>,
    /// Actions that were just pressed this frame
    pub just_pressed: HashSet<BallAction>,
    /// Actions that were just released this frame
    pub just_released: HashSet<BallAction>,
    /// Movement stick, x right and y forward
    pub stick: Vec2,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: BallAction) {
        if self.held.insert(action) {
            self.just_pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: BallAction) {
        if self.held.remove(&action) {
            self.just_released.insert(action);
        }
    }

    pub fn is_held(&self, action: BallAction) -> bool {
        self.held.contains(&action)
    }

    pub fn is_just_pressed(&self, action: BallAction) -> bool {
        self.just_pressed.contains(&action)
    }

    pub fn is_just_released(&self, action: BallAction) -> bool {
        self.just_released.contains(&action)
    }

    /// Clear frame-specific data (call at end of frame)
    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

/// Orientation of the camera the player steers relative to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for CameraBasis {
    fn default() -> Self {
        Self {
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        }
    }
}

/// Maps player input onto one ball
#[derive(Debug, Clone, Default)]
pub struct BallControl {
    mode: ControlMode,
    desired_direction: Vec3,
    last_direction: Vec3,
}

impl BallControl {
    pub fn new(mode: ControlMode) -> Self {
        Self {
            mode,
            desired_direction: Vec3::ZERO,
            last_direction: Vec3::ZERO,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Direction to pass to the next fixed step
    pub fn desired_direction(&self) -> Vec3 {
        self.desired_direction
    }

    /// Last non-zero direction (planar modes)
    pub fn last_direction(&self) -> Vec3 {
        self.last_direction
    }

    /// Resolve the stick against the camera, flattened against gravity.
    ///
    /// The result is a unit vector, or zero without input.
    pub fn resolve_direction(&mut self, stick: Vec2, camera: &CameraBasis, up: Vec3) -> Vec3 {
        let right = project_on_plane(camera.right, up).normalize_or_zero();

        let direction = match self.mode {
            ControlMode::SideScroller => right * stick.x,
            ControlMode::ThreeD => {
                let forward = project_on_plane(camera.forward, up).normalize_or_zero();
                forward * stick.y + right * stick.x
            }
            ControlMode::TopDown => {
                let forward = project_on_plane(camera.up, up).normalize_or_zero();
                forward * stick.y + right * stick.x
            }
        };
        let direction = if direction.is_finite() {
            direction.normalize_or_zero()
        } else {
            Vec3::ZERO
        };

        if !is_zero(direction) {
            self.last_direction = direction;
        }
        self.desired_direction = direction;
        direction
    }

    /// Forward this frame's input to the ball. Returns the resolved
    /// movement direction.
    pub fn apply(&mut self, ball: &mut RollerBall, input: &ControlState, camera: &CameraBasis) -> Vec3 {
        let up = ball.up();
        let desired = self.resolve_direction(input.stick, camera, up);

        if input.is_just_pressed(BallAction::Jump) {
            ball.try_jump();
        }
        if input.is_just_released(BallAction::Jump) && ball.state() == LocomotionState::Airborne {
            ball.evaluate_jump_cut_off();
        }
        if input.is_just_pressed(BallAction::Dash) && ball.state() == LocomotionState::Airborne {
            let fallback = if self.mode.is_planar() {
                self.last_direction
            } else {
                project_on_plane(camera.forward, up).normalize_or_zero()
            };
            ball.try_dash(desired, fallback);
        }

        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RollerBallConfig;
    use rollerball_physics::MemoryBody;

    fn tilted_camera() -> CameraBasis {
        CameraBasis {
            forward: Vec3::new(0.0, -1.0, -1.0).normalize(),
            right: Vec3::X,
            up: Vec3::new(0.0, 1.0, -1.0).normalize(),
        }
    }

    #[test]
    fn test_press_release_edges() {
        let mut input = ControlState::new();
        input.press(BallAction::Jump);
        assert!(input.is_held(BallAction::Jump));
        assert!(input.is_just_pressed(BallAction::Jump));

        input.clear_frame();
        input.press(BallAction::Jump);
        assert!(!input.is_just_pressed(BallAction::Jump));

        input.release(BallAction::Jump);
        assert!(input.is_just_released(BallAction::Jump));
        assert!(!input.is_held(BallAction::Jump));
    }

    #[test]
    fn test_camera_forward_is_flattened() {
        let mut control = BallControl::new(ControlMode::ThreeD);
        let direction = control.resolve_direction(Vec2::new(0.0, 1.0), &tilted_camera(), Vec3::Y);
        assert!(direction.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn test_diagonal_is_unit_length() {
        let mut control = BallControl::new(ControlMode::ThreeD);
        let direction =
            control.resolve_direction(Vec2::new(1.0, 1.0), &CameraBasis::default(), Vec3::Y);
        assert!((direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_stick_is_unit_length() {
        let mut control = BallControl::new(ControlMode::ThreeD);
        let direction =
            control.resolve_direction(Vec2::new(0.3, 0.0), &CameraBasis::default(), Vec3::Y);
        assert!(direction.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_top_down_steers_along_camera_up() {
        let camera = CameraBasis {
            forward: Vec3::NEG_Y,
            right: Vec3::X,
            up: Vec3::NEG_Z,
        };
        let mut control = BallControl::new(ControlMode::TopDown);

        let direction = control.resolve_direction(Vec2::new(0.0, 1.0), &camera, Vec3::Y);
        assert!(direction.abs_diff_eq(Vec3::NEG_Z, 1e-6));

        let direction = control.resolve_direction(Vec2::new(1.0, 0.0), &camera, Vec3::Y);
        assert!(direction.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_side_scroller_ignores_forward_axis() {
        let mut control = BallControl::new(ControlMode::SideScroller);
        let direction =
            control.resolve_direction(Vec2::new(-0.5, 1.0), &CameraBasis::default(), Vec3::Y);
        assert_eq!(direction, Vec3::NEG_X);
        assert_eq!(control.last_direction(), Vec3::NEG_X);

        control.resolve_direction(Vec2::ZERO, &CameraBasis::default(), Vec3::Y);
        assert_eq!(control.desired_direction(), Vec3::ZERO);
        assert_eq!(control.last_direction(), Vec3::NEG_X);
    }

    #[test]
    fn test_jump_press_reaches_ball() {
        let mut ball = RollerBall::new(RollerBallConfig::default()).unwrap();
        let mut control = BallControl::new(ControlMode::ThreeD);
        let mut input = ControlState::new();

        input.press(BallAction::Jump);
        control.apply(&mut ball, &input, &CameraBasis::default());
        assert!(ball.should_jump());
    }

    #[test]
    fn test_dash_falls_back_to_last_direction_in_planar_modes() {
        let mut ball = RollerBall::new(RollerBallConfig::default()).unwrap();
        let mut body = MemoryBody::new(Vec3::new(0.0, 5.0, 0.0), 0.5);
        ball.fixed_update(&mut body, Vec3::ZERO);

        let mut control = BallControl::new(ControlMode::SideScroller);
        let mut input = ControlState::new();
        input.stick = Vec2::new(-1.0, 0.0);
        control.apply(&mut ball, &input, &CameraBasis::default());

        input.stick = Vec2::ZERO;
        input.press(BallAction::Dash);
        control.apply(&mut ball, &input, &CameraBasis::default());
        ball.fixed_update(&mut body, Vec3::ZERO);

        let events = ball.drain_events();
        assert!(events.contains(&crate::events::BallEvent::Dashed {
            index: 0,
            direction: Vec3::NEG_X,
        }));
    }

    #[test]
    fn test_dash_ignored_on_ground() {
        let mut ball = RollerBall::new(RollerBallConfig::default()).unwrap();
        let mut control = BallControl::new(ControlMode::ThreeD);
        let mut input = ControlState::new();
        input.press(BallAction::Dash);

        control.apply(&mut ball, &input, &CameraBasis::default());
        assert_eq!(ball.dash_count(), 0);
    }
}
