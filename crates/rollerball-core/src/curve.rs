//! Piecewise-linear animation curves
//!
//! Squash-and-stretch and dash deformations are keyed on a normalized time in
//! `[0, 1]`. Curves are authored as sorted keyframes and evaluated with linear
//! interpolation, holding the end values outside the keyed range.

use serde::{Deserialize, Serialize};

/// A single curve key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Errors that can occur when building a curve
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("curve has no keyframes")]
    Empty,

    #[error("keyframe {0} is not finite")]
    NotFinite(usize),

    #[error("keyframe {0} is out of order")]
    Unsorted(usize),
}

/// Piecewise-linear curve over normalized time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
}

impl Default for AnimationCurve {
    /// Stretch to 1.25 at the midpoint and settle back to rest
    fn default() -> Self {
        Self {
            keys: vec![
                Keyframe::new(0.0, 1.0),
                Keyframe::new(0.5, 1.25),
                Keyframe::new(1.0, 1.0),
            ],
        }
    }
}

impl AnimationCurve {
    /// Build a curve from keyframes sorted by time
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        let curve = Self { keys };
        curve.validate()?;
        Ok(curve)
    }

    /// A curve that always evaluates to `value`
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    /// Check the keyframes are non-empty, finite and sorted
    pub fn validate(&self) -> Result<(), CurveError> {
        if self.keys.is_empty() {
            return Err(CurveError::Empty);
        }
        for (i, key) in self.keys.iter().enumerate() {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(CurveError::NotFinite(i));
            }
            if i > 0 && key.time < self.keys[i - 1].time {
                return Err(CurveError::Unsorted(i));
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Evaluate the curve at time `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                return a.value + (b.value - a.value) * ((t - a.time) / span);
            }
        }
        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_interpolates() {
        let curve = AnimationCurve::default();
        assert_eq!(curve.evaluate(0.0), 1.0);
        assert!((curve.evaluate(0.25) - 1.125).abs() < 1e-6);
        assert_eq!(curve.evaluate(0.5), 1.25);
        assert_eq!(curve.evaluate(2.0), 1.0);
        assert_eq!(curve.evaluate(-1.0), 1.0);
    }

    #[test]
    fn test_rejects_unsorted() {
        let result = AnimationCurve::new(vec![Keyframe::new(0.5, 1.0), Keyframe::new(0.1, 1.0)]);
        assert_eq!(result, Err(CurveError::Unsorted(1)));
        assert_eq!(AnimationCurve::new(Vec::new()), Err(CurveError::Empty));
    }

    #[test]
    fn test_constant() {
        let curve = AnimationCurve::constant(0.8);
        assert_eq!(curve.evaluate(0.3), 0.8);
    }
}
