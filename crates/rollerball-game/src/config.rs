//! Ball configuration
//!
//! Every tunable of the controller lives in [`RollerBallConfig`]. Files may be
//! partial; missing fields take their defaults. A config is validated once,
//! when a ball is built from it.

use std::path::{Path, PathBuf};

use glam::Vec3;
use rollerball_core::CurveError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dash::{DashRecharge, DashSpec};
use crate::ground::{normalize_bands, SlopeBand};
use crate::jump::JumpSpec;
use crate::profile::{is_positive, MovementProfile};

/// Largest slope angle that can be configured (degrees)
pub const MAX_CONFIGURABLE_SLOPE: f32 = 89.9;

/// Errors that can occur while loading or validating a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("movement profile '{profile}' is invalid: {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("jump {index} is invalid: {reason}")]
    InvalidJump { index: usize, reason: String },

    #[error("dash {index} is invalid: {reason}")]
    InvalidDash { index: usize, reason: String },

    #[error("auto slope needs max_slope_angle above min_slope_angle (both {0}°)")]
    DegenerateSlopeRange(f32),

    #[error("invalid animation curve: {0}")]
    Curve(#[from] CurveError),
}

/// How steering adapts to slopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlopeMode {
    /// Fade control out continuously between the min and max slope angle
    Auto,
    /// Switch to the profile of the band the slope angle falls in
    Manual { bands: Vec<SlopeBand> },
}

/// Slope thresholds and handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Steepest angle still treated as flat ground (degrees)
    pub min_slope_angle: f32,
    /// Steepest angle the ball can climb (degrees)
    pub max_slope_angle: f32,
    pub mode: SlopeMode,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self {
            min_slope_angle: 0.0,
            max_slope_angle: 45.0,
            mode: SlopeMode::Auto,
        }
    }
}

impl SlopeConfig {
    pub fn is_auto(&self) -> bool {
        matches!(self.mode, SlopeMode::Auto)
    }

    /// Manual bands, empty in auto mode
    pub fn bands(&self) -> &[SlopeBand] {
        match &self.mode {
            SlopeMode::Auto => &[],
            SlopeMode::Manual { bands } => bands,
        }
    }
}

/// Dash chain and recharge policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub recharge: DashRecharge,
    pub dashes: Vec<DashSpec>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            recharge: DashRecharge::default(),
            dashes: vec![DashSpec::default()],
        }
    }
}

/// Complete configuration of one ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollerBallConfig {
    /// Length of one simulation step (seconds)
    pub fixed_timestep: f32,
    /// Collider radius at rest (m)
    pub sphere_radius: f32,
    /// Gravity acting on the ball unless overridden
    pub gravity: Vec3,

    /// Steering on flat ground (and steep ground)
    pub ground: MovementProfile,
    /// Steering in the air
    pub air: MovementProfile,
    /// Fraction of acceleration left on steep ground
    pub steep_factor: f32,
    /// Redirect momentum along the spin when bumping into a wall
    pub shift_momentum_on_collision: bool,
    /// Cap air speed at the speed the ball took off with
    pub has_speed_capped_on_jump: bool,
    /// Allow steering toward a new direction mid-air
    pub can_change_direction_in_air: bool,
    /// Steer along walls and ceilings touched while airborne
    pub wall_movement: bool,
    /// Vertical squash while turning hard on the ground
    pub turning_squash: f32,

    pub slopes: SlopeConfig,

    /// Terminal fall speed, also the cap when sliding down slopes
    pub fall_speed_cap: f32,
    /// Grace period after leaving ground during which a first jump is allowed
    pub coyote_time: f32,
    /// How long a jump press waits for a landing when no charge is left
    pub input_buffer: f32,
    /// Jump chain, one entry per jump
    pub jumps: Vec<JumpSpec>,

    pub dash: DashConfig,

    /// Distance to probe for ground when contacts yield none
    pub ground_probe_distance: Option<f32>,
}

impl Default for RollerBallConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 50.0,
            sphere_radius: 0.5,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            ground: MovementProfile::default(),
            air: MovementProfile::air(),
            steep_factor: 0.66,
            shift_momentum_on_collision: false,
            has_speed_capped_on_jump: true,
            can_change_direction_in_air: true,
            wall_movement: false,
            turning_squash: 0.8,
            slopes: SlopeConfig::default(),
            fall_speed_cap: 12.0,
            coyote_time: 0.1,
            input_buffer: 0.1,
            jumps: vec![
                JumpSpec::default(),
                JumpSpec {
                    jump_height: 1.25,
                    gravity_damp_on_rise: 0.9,
                    ..Default::default()
                },
            ],
            dash: DashConfig::default(),
            ground_probe_distance: None,
        }
    }
}

impl RollerBallConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded ball config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would stall or destabilize the controller, and
    /// normalize slope thresholds and bands
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !is_positive(self.fixed_timestep) {
            return Err(invalid("fixed_timestep", "must be positive"));
        }
        if !is_positive(self.sphere_radius) {
            return Err(invalid("sphere_radius", "must be positive"));
        }
        if !self.gravity.is_finite() || self.gravity.length_squared() <= f32::EPSILON {
            return Err(invalid("gravity", "must be a finite, non-zero vector"));
        }

        self.ground.validate("ground")?;
        self.air.validate("air")?;

        if !(0.0..=1.0).contains(&self.steep_factor) {
            return Err(invalid("steep_factor", "must be in [0, 1]"));
        }
        if !(self.turning_squash > 0.0 && self.turning_squash <= 1.0) {
            return Err(invalid("turning_squash", "must be in (0, 1]"));
        }
        if !is_positive(self.fall_speed_cap) {
            return Err(invalid("fall_speed_cap", "must be positive"));
        }
        if !(self.coyote_time.is_finite() && self.coyote_time >= 0.0) {
            return Err(invalid("coyote_time", "must be non-negative"));
        }
        if !(self.input_buffer.is_finite() && self.input_buffer >= 0.0) {
            return Err(invalid("input_buffer", "must be non-negative"));
        }
        if let Some(distance) = self.ground_probe_distance {
            if !is_positive(distance) {
                return Err(invalid("ground_probe_distance", "must be positive"));
            }
        }

        self.validate_slopes()?;

        for (index, jump) in self.jumps.iter().enumerate() {
            jump.validate(index)?;
        }
        for (index, dash) in self.dash.dashes.iter().enumerate() {
            dash.validate(index, self.fixed_timestep)?;
        }
        if let DashRecharge::Cooldown { seconds } = self.dash.recharge {
            if !(seconds.is_finite() && seconds >= 0.0) {
                return Err(invalid("dash.recharge.seconds", "must be non-negative"));
            }
        }

        Ok(())
    }

    fn validate_slopes(&mut self) -> Result<(), ConfigError> {
        let slopes = &mut self.slopes;
        for (field, angle) in [
            ("slopes.min_slope_angle", slopes.min_slope_angle),
            ("slopes.max_slope_angle", slopes.max_slope_angle),
        ] {
            if !(0.0..=MAX_CONFIGURABLE_SLOPE).contains(&angle) {
                return Err(invalid(field, "must be within [0, 89.9] degrees"));
            }
        }

        slopes.min_slope_angle = slopes.min_slope_angle.min(slopes.max_slope_angle);
        let (min, max) = (slopes.min_slope_angle, slopes.max_slope_angle);

        match &mut slopes.mode {
            SlopeMode::Auto => {
                if max <= min {
                    return Err(ConfigError::DegenerateSlopeRange(min));
                }
            }
            SlopeMode::Manual { bands } => {
                if bands
                    .iter()
                    .any(|band| !band.lower_angle.is_finite() || !band.higher_angle.is_finite())
                {
                    return Err(invalid("slopes.mode.bands", "angles must be finite"));
                }
                normalize_bands(bands, min, max);
                for (index, band) in bands.iter().enumerate() {
                    band.profile.validate(&format!("slope band {index}"))?;
                }
            }
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let mut config = RollerBallConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.jumps.len(), 2);
        assert_eq!(config.dash.dashes.len(), 1);
    }

    #[test]
    fn test_partial_toml() {
        let config = RollerBallConfig::from_toml_str(
            r#"
            fall_speed_cap = 20.0
            coyote_time = 0.2

            [ground]
            max_speed = 9.0

            [[jumps]]
            jump_height = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.fall_speed_cap, 20.0);
        assert_eq!(config.coyote_time, 0.2);
        assert_eq!(config.ground.max_speed, 9.0);
        assert_eq!(config.jumps.len(), 1);
        assert_eq!(config.jumps[0].jump_height, 3.0);
        assert_eq!(config.air, MovementProfile::air());
    }

    #[test]
    fn test_manual_slopes_from_toml() {
        let config = RollerBallConfig::from_toml_str(
            r#"
            [slopes]
            min_slope_angle = 10.0
            max_slope_angle = 45.0

            [slopes.mode]
            kind = "manual"

            [[slopes.mode.bands]]
            lower_angle = 0.0
            higher_angle = 25.0
            profile = { max_speed = 5.0 }

            [[slopes.mode.bands]]
            higher_angle = 60.0
            profile = { max_speed = 3.0 }
            "#,
        )
        .unwrap();

        let bands = config.slopes.bands();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].lower_angle, 10.0);
        assert_eq!(bands[1].lower_angle, 25.0);
        assert_eq!(bands[1].higher_angle, 45.0);
    }

    #[test]
    fn test_rejects_degenerate_auto_slope() {
        let mut config = RollerBallConfig::default();
        config.slopes.min_slope_angle = 30.0;
        config.slopes.max_slope_angle = 30.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DegenerateSlopeRange(_))
        ));
    }

    #[test]
    fn test_min_slope_clamped_to_max() {
        let mut config = RollerBallConfig::default();
        config.slopes.min_slope_angle = 50.0;
        config.slopes.max_slope_angle = 40.0;
        config.slopes.mode = SlopeMode::Manual { bands: Vec::new() };
        config.validate().unwrap();
        assert_eq!(config.slopes.min_slope_angle, 40.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = RollerBallConfig {
            sphere_radius: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = RollerBallConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = RollerBallConfig::default();
        config.dash.dashes[0].dash_duration = 0.001;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDash { index: 0, .. })
        ));

        let mut config = RollerBallConfig::default();
        config.jumps[1].gravity_damp_on_rise = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidJump { index: 1, .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            RollerBallConfig::from_toml_str("fall_speed_cap = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
