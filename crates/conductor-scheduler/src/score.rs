//! Pure scoring functions. Nothing here reads the clock or mutates state.

use chrono::{DateTime, Utc};
use conductor_core::{WorkerState, duration_secs};

pub const SUCCESS_WEIGHT: f64 = 0.5;
pub const COST_WEIGHT: f64 = 0.3;
pub const RECENCY_WEIGHT: f64 = 0.2;

/// Lower bound for the cost, recency and task-cost terms.
pub const TERM_FLOOR: f64 = 0.1;

/// Multiplier applied to a worker that is not eligible for the task.
pub const INELIGIBLE_WEIGHT: f64 = 0.1;

/// Weighted performance score for one worker, in `[0.05, 1.0]`.
pub fn performance_score(
    worker: &WorkerState,
    now: DateTime<Utc>,
    cost_cap: f64,
    stale_window_secs: f64,
) -> f64 {
    let success = if worker.success_rate.is_finite() {
        worker.success_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cost_efficiency = floored(1.0 - worker.cost_spent / cost_cap);
    let age = duration_secs(worker.heartbeat_age(now));
    let recency = floored(1.0 - age / stale_window_secs);

    SUCCESS_WEIGHT * success + COST_WEIGHT * cost_efficiency + RECENCY_WEIGHT * recency
}

/// `priority / 100`.
pub fn priority_weight(priority: u32) -> f64 {
    f64::from(priority) / 100.0
}

/// Cheaper tasks weigh more; bottoms out at [`TERM_FLOOR`].
pub fn task_cost_weight(estimated_cost: f64, task_cost_cap: f64) -> f64 {
    floored(1.0 - estimated_cost / task_cost_cap)
}

pub fn eligibility_weight(eligible: bool) -> f64 {
    if eligible { 1.0 } else { INELIGIBLE_WEIGHT }
}

fn floored(value: f64) -> f64 {
    if value.is_nan() {
        TERM_FLOOR
    } else {
        value.clamp(TERM_FLOOR, 1.0)
    }
}
