//! RollerBall - Headless simulation of the rolling ball controller
//!
//! Builds a small test course, spawns one ball and drives it with a scripted
//! input timeline, logging events and periodic snapshots.

mod script;
mod settings;

use anyhow::{bail, Context, Result};
use glam::{Quat, Vec3};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rollerball_game::{BallControl, CameraBasis, ControlState, RollerBall};
use rollerball_physics::{BallBodyConfig, BallHandle, PhysicsConfig, PhysicsWorld};

use crate::script::ScriptPlayer;
use crate::settings::SimulationSettings;

/// Command line options
#[derive(Debug, Default)]
struct Args {
    /// Print snapshots as JSON lines instead of logging them
    json: bool,
    /// Override the number of steps to run
    ticks: Option<u64>,
}

impl Args {
    fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "--ticks" => {
                    let value = args.next().context("--ticks needs a value")?;
                    let ticks = value
                        .parse()
                        .with_context(|| format!("Invalid tick count {value:?}"))?;
                    parsed.ticks = Some(ticks);
                }
                other => bail!("Unknown argument {other:?} (usage: rollerball [--json] [--ticks N])"),
            }
        }
        Ok(parsed)
    }
}

/// Simulation state
struct Simulation {
    world: PhysicsWorld,
    handle: BallHandle,
    ball: RollerBall,
    control: BallControl,
    camera: CameraBasis,
    input: ControlState,
    script: ScriptPlayer,
    snapshot_interval: u64,
    json: bool,
}

impl Simulation {
    fn new(settings: SimulationSettings, json: bool) -> Result<Self> {
        let mut world = PhysicsWorld::with_config(PhysicsConfig {
            gravity: settings.physics.gravity,
            timestep: settings.physics.timestep,
        });
        build_course(&mut world);

        let config = settings.ball_config();
        let body_config = BallBodyConfig {
            radius: config.sphere_radius,
            ..Default::default()
        };
        let handle = world
            .spawn_ball(&body_config, settings.spawn)
            .context("Failed to spawn ball")?;
        let ball = RollerBall::new(config).context("Invalid ball configuration")?;

        Ok(Self {
            world,
            handle,
            ball,
            control: BallControl::new(settings.control),
            camera: CameraBasis::default(),
            input: ControlState::new(),
            script: ScriptPlayer::new(settings.script),
            snapshot_interval: settings.snapshot_interval.max(1),
            json,
        })
    }

    fn step(&mut self, tick: u64) -> Result<()> {
        let time = tick as f32 * self.world.timestep();
        self.script.advance(time, &mut self.input);
        let desired = self.control.apply(&mut self.ball, &self.input, &self.camera);
        self.input.clear_frame();

        {
            let mut body = self.world.ball_mut(self.handle)?;
            self.ball.fixed_update(&mut body, desired);
        }
        self.world.step();

        for event in self.ball.drain_events() {
            info!(tick, ?event, "Ball event");
        }

        if tick % self.snapshot_interval == 0 {
            let snapshot = self.ball.snapshot();
            if self.json {
                println!("{}", serde_json::to_string(&snapshot)?);
            } else {
                info!("[{:>5}] {}", tick, snapshot);
            }
        }
        Ok(())
    }
}

/// Floor, a 30° ramp ahead of the spawn point and a wall behind the ramp
fn build_course(world: &mut PhysicsWorld) {
    world.create_ground(0.0);

    let ramp_angle = 30f32.to_radians();
    let ramp_half = Vec3::new(3.0, 0.25, 6.0);
    let ramp_center = Vec3::new(0.0, ramp_half.z * ramp_angle.sin(), -14.0);
    // Rising toward -Z
    world.create_static_box(ramp_half, ramp_center, Quat::from_rotation_x(ramp_angle));

    world.create_static_box(
        Vec3::new(8.0, 4.0, 0.5),
        Vec3::new(0.0, 4.0, -24.0),
        Quat::IDENTITY,
    );
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = Args::parse()?;
    let settings = SimulationSettings::load();
    let ticks = args.ticks.unwrap_or(settings.ticks);

    info!("Starting RollerBall simulation ({} steps)...", ticks);

    let mut simulation = Simulation::new(settings, args.json)?;
    for tick in 0..ticks {
        simulation.step(tick)?;
    }

    if !simulation.script.is_finished() {
        info!("Simulation ended before the input script finished");
    }
    info!("Simulation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse_from(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--json", "--ticks", "25"]).unwrap();
        assert!(parsed.json);
        assert_eq!(parsed.ticks, Some(25));

        assert!(args(&["--ticks"]).is_err());
        assert!(args(&["--ticks", "many"]).is_err());
        assert!(args(&["--fast"]).is_err());
    }

    #[test]
    fn test_ball_settles_on_floor() {
        let settings = SimulationSettings {
            script: Vec::new(),
            ..Default::default()
        };
        let mut simulation = Simulation::new(settings, false).unwrap();
        for tick in 0..50 {
            simulation.step(tick).unwrap();
        }

        let snapshot = simulation.ball.snapshot();
        assert_eq!(snapshot.state, rollerball_game::LocomotionState::Grounded);
        assert!(snapshot.speed < 0.1);
    }
}
