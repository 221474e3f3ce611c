//! Simulation settings loaded from TOML
//!
//! Settings are read from `$ROLLERBALL_CONFIG` if set, otherwise from
//! `~/.config/rollerball/settings.toml`.

use std::fs;
use std::path::PathBuf;

use glam::{Vec2, Vec3};
use rollerball_game::{BallAction, ControlMode, RollerBallConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable overriding the settings path
pub const CONFIG_ENV: &str = "ROLLERBALL_CONFIG";

/// All simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub physics: PhysicsSettings,
    pub ball: RollerBallConfig,
    pub control: ControlMode,
    /// Where the ball is spawned
    pub spawn: Vec3,
    /// Number of fixed steps to run
    pub ticks: u64,
    /// Log a snapshot every this many steps
    pub snapshot_interval: u64,
    pub script: Vec<ScriptStep>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings::default(),
            ball: RollerBallConfig::default(),
            control: ControlMode::ThreeD,
            spawn: Vec3::new(0.0, 0.55, 0.0),
            ticks: 400,
            snapshot_interval: 10,
            script: default_script(),
        }
    }
}

/// World physics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    /// Fixed step in seconds
    pub timestep: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 50.0,
        }
    }
}

/// One entry of the scripted input timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    /// Simulation time in seconds at which the step applies
    pub at: f32,
    /// New stick position, if it changes
    pub stick: Option<Vec2>,
    pub press: Vec<BallAction>,
    pub release: Vec<BallAction>,
}

impl ScriptStep {
    fn stick(at: f32, x: f32, y: f32) -> Self {
        Self {
            at,
            stick: Some(Vec2::new(x, y)),
            ..Default::default()
        }
    }

    fn press(at: f32, action: BallAction) -> Self {
        Self {
            at,
            press: vec![action],
            ..Default::default()
        }
    }

    fn release(at: f32, action: BallAction) -> Self {
        Self {
            at,
            release: vec![action],
            ..Default::default()
        }
    }
}

/// Roll toward the ramp, hop, dash sideways, then climb
fn default_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::stick(0.0, 0.0, 1.0),
        ScriptStep::press(1.0, BallAction::Jump),
        ScriptStep::release(1.2, BallAction::Jump),
        ScriptStep::stick(1.4, 1.0, 0.0),
        ScriptStep::press(1.4, BallAction::Dash),
        ScriptStep::release(1.5, BallAction::Dash),
        ScriptStep::stick(2.5, 0.0, 1.0),
        ScriptStep::stick(7.0, 0.0, 0.0),
    ]
}

impl SimulationSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rollerball"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            warn!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Ball configuration stepped in lockstep with the physics world
    pub fn ball_config(&self) -> RollerBallConfig {
        RollerBallConfig {
            fixed_timestep: self.physics.timestep,
            gravity: self.physics.gravity,
            ..self.ball.clone()
        }
    }
}
