//! Movement profiles
//!
//! A profile is the set of tunables the velocity integrator steers with in
//! one locomotion context (flat ground, air, a slope band). Rates are either
//! authored directly or derived from how long reaching/leaving max speed
//! should take.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How acceleration and deceleration are specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AccelerationRates {
    /// Seconds to go from rest to max speed, and from max speed to rest
    Timed {
        acceleration_time: f32,
        deceleration_time: f32,
    },
    /// Rates in m/s² used as-is
    Manual { acceleration: f32, deceleration: f32 },
}

/// Steering parameters for one locomotion context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementProfile {
    /// Target speed when input is fully pressed (m/s)
    pub max_speed: f32,
    /// Acceleration multiplier applied while steering against current velocity
    pub turning_factor: f32,
    /// Acceleration/deceleration rates
    pub rates: AccelerationRates,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::timed(6.0, 1.0, 3.0, 1.5)
    }
}

impl MovementProfile {
    /// Profile whose rates are derived from ramp-up/ramp-down times
    pub fn timed(
        max_speed: f32,
        acceleration_time: f32,
        deceleration_time: f32,
        turning_factor: f32,
    ) -> Self {
        Self {
            max_speed,
            turning_factor,
            rates: AccelerationRates::Timed {
                acceleration_time,
                deceleration_time,
            },
        }
    }

    /// Profile with explicit rates
    pub fn manual(max_speed: f32, acceleration: f32, deceleration: f32, turning_factor: f32) -> Self {
        Self {
            max_speed,
            turning_factor,
            rates: AccelerationRates::Manual {
                acceleration,
                deceleration,
            },
        }
    }

    /// Default profile for airborne steering
    pub fn air() -> Self {
        Self::timed(6.0, 1.5, 4.0, 1.2)
    }

    /// Acceleration in m/s²
    pub fn acceleration(&self) -> f32 {
        match self.rates {
            AccelerationRates::Timed {
                acceleration_time, ..
            } => self.max_speed / acceleration_time,
            AccelerationRates::Manual { acceleration, .. } => acceleration,
        }
    }

    /// Deceleration in m/s²
    pub fn deceleration(&self) -> f32 {
        match self.rates {
            AccelerationRates::Timed {
                deceleration_time, ..
            } => self.max_speed / deceleration_time,
            AccelerationRates::Manual { deceleration, .. } => deceleration,
        }
    }

    /// Check the profile for values that would stall or invert the integrator
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidProfile {
            profile: name.to_string(),
            reason: reason.to_string(),
        };

        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(invalid("max_speed must be a non-negative number"));
        }
        if self.turning_factor.is_nan() || self.turning_factor < 1.0 {
            return Err(invalid("turning_factor must be at least 1"));
        }

        let (rise, fall, what) = match self.rates {
            AccelerationRates::Timed {
                acceleration_time,
                deceleration_time,
            } => (acceleration_time, deceleration_time, "time"),
            AccelerationRates::Manual {
                acceleration,
                deceleration,
            } => (acceleration, deceleration, "rate"),
        };
        if !is_positive(rise) {
            return Err(invalid(&format!("acceleration {what} must be positive")));
        }
        if !is_positive(fall) {
            return Err(invalid(&format!("deceleration {what} must be positive")));
        }

        Ok(())
    }
}

pub(crate) fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
