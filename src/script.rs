//! Scripted input playback for the headless simulation

use rollerball_game::ControlState;

use crate::settings::ScriptStep;

/// Plays a timeline of [`ScriptStep`]s into a [`ControlState`]
#[derive(Debug, Clone)]
pub struct ScriptPlayer {
    steps: Vec<ScriptStep>,
    next: usize,
}

impl ScriptPlayer {
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { steps, next: 0 }
    }

    /// Apply every step due at or before `time`. Returns how many fired.
    pub fn advance(&mut self, time: f32, input: &mut ControlState) -> usize {
        let mut fired = 0;
        while let Some(step) = self.steps.get(self.next) {
            if step.at > time {
                break;
            }
            if let Some(stick) = step.stick {
                input.stick = stick;
            }
            for &action in &step.press {
                input.press(action);
            }
            for &action in &step.release {
                input.release(action);
            }
            self.next += 1;
            fired += 1;
        }
        fired
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rollerball_game::BallAction;

    fn step(at: f32, press: Option<BallAction>, stick: Option<Vec2>) -> ScriptStep {
        ScriptStep {
            at,
            stick,
            press: press.into_iter().collect(),
            release: Vec::new(),
        }
    }

    #[test]
    fn test_steps_fire_in_time_order() {
        let mut player = ScriptPlayer::new(vec![
            step(0.5, Some(BallAction::Jump), None),
            step(0.0, None, Some(Vec2::new(0.0, 1.0))),
        ]);
        let mut input = ControlState::new();

        assert_eq!(player.advance(0.0, &mut input), 1);
        assert_eq!(input.stick, Vec2::new(0.0, 1.0));
        assert!(!input.is_held(BallAction::Jump));

        assert_eq!(player.advance(0.48, &mut input), 0);
        assert_eq!(player.advance(0.5, &mut input), 1);
        assert!(input.is_just_pressed(BallAction::Jump));
        assert!(player.is_finished());
    }

    #[test]
    fn test_late_steps_catch_up() {
        let mut player = ScriptPlayer::new(vec![
            step(0.1, Some(BallAction::Jump), None),
            step(0.2, Some(BallAction::Dash), None),
        ]);
        let mut input = ControlState::new();

        assert_eq!(player.advance(1.0, &mut input), 2);
        assert!(input.is_held(BallAction::Jump));
        assert!(input.is_held(BallAction::Dash));
    }
}
