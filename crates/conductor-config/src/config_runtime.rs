use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the driving loop that calls `tick` and `assign_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Interval between loop iterations.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// How long `conductor run` keeps the loop going.
    #[serde(default = "default_run_minutes")]
    pub run_minutes: f64,
    /// Emit a health line every N rotations (0 disables it).
    #[serde(default = "default_health_every_rotations")]
    pub health_every_rotations: u64,
    /// Attempts per task before a repeatedly rejected task is dropped.
    #[serde(default = "default_max_assign_attempts")]
    pub max_assign_attempts: u32,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_run_minutes() -> f64 {
    480.0
}

fn default_health_every_rotations() -> u64 {
    10
}

fn default_max_assign_attempts() -> u32 {
    3
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            run_minutes: default_run_minutes(),
            health_every_rotations: default_health_every_rotations(),
            max_assign_attempts: default_max_assign_attempts(),
        }
    }
}

impl RuntimeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Total run length. Non-finite or negative values collapse to zero.
    pub fn run_duration(&self) -> Duration {
        if self.run_minutes.is_finite() && self.run_minutes > 0.0 {
            Duration::from_secs_f64(self.run_minutes * 60.0)
        } else {
            Duration::ZERO
        }
    }
}
