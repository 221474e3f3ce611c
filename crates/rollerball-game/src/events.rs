//! Gameplay events raised by the ball for hosts to react to (VFX, audio)

use glam::Vec3;
use serde::Serialize;

use crate::ball::LocomotionState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BallEvent {
    /// The locomotion state changed
    StateChanged {
        from: LocomotionState,
        to: LocomotionState,
    },
    /// Touched down after being airborne
    Landed,
    /// A jump launched; `index` is its position in the chain
    Jumped { index: usize },
    /// A dash started
    Dashed { index: usize, direction: Vec3 },
    /// Steering against the current velocity (burnout)
    Turning,
    /// A spent dash chain became available again
    DashRecharged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_string(&BallEvent::Jumped { index: 1 }).unwrap();
        assert_eq!(json, r#"{"event":"jumped","index":1}"#);

        let json = serde_json::to_string(&BallEvent::StateChanged {
            from: LocomotionState::Grounded,
            to: LocomotionState::Airborne,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"state_changed","from":"grounded","to":"airborne"}"#);
    }
}
