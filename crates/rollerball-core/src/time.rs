//! Fixed-step time keeping
//!
//! Everything in the controller advances in lockstep with the physics step.
//! `FixedClock` counts those steps; `steps_for` converts configured durations
//! into whole step counts.

/// Fixed-step simulation clock
#[derive(Debug, Clone)]
pub struct FixedClock {
    /// Fixed timestep (in seconds)
    fixed_timestep: f32,
    /// Number of fixed steps taken since start
    ticks: u64,
}

impl FixedClock {
    /// Create a clock that only ever advances by whole fixed steps
    pub fn with_timestep(fixed_timestep: f32) -> Self {
        Self {
            fixed_timestep,
            ticks: 0,
        }
    }

    /// Number of steps taken so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds since start
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.fixed_timestep as f64
    }

    /// Seconds between a past timestamp and now
    pub fn since(&self, timestamp: f64) -> f64 {
        self.elapsed() - timestamp
    }

    /// Advance by exactly one fixed step
    pub fn tick(&mut self) {
        self.ticks += 1;
    }
}

/// Number of whole steps of length `timestep` covering `seconds`, rounded to nearest
pub fn steps_for(seconds: f32, timestep: f32) -> u32 {
    if timestep <= 0.0 || seconds <= 0.0 {
        return 0;
    }
    (seconds / timestep).round() as u32
}
