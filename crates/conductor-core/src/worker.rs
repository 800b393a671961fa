use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::WorkerId;

/// Bookkeeping for one named conductor.
///
/// Instances are owned by the scheduler; callers only ever see shared
/// references or serialized snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerState {
    pub name: WorkerId,
    pub active: bool,
    pub last_heartbeat: DateTime<Utc>,
    /// Tasks ever assigned to this worker. Never decreases.
    pub task_count: u64,
    /// Externally reported, kept within `[0, 1]`.
    pub success_rate: f64,
    /// Externally reported cumulative cost. Never decreases.
    pub cost_spent: f64,
    /// Start of the current (or most recent) active window.
    pub cycle_start: Option<DateTime<Utc>>,
    /// Index into the duration sequence, always `< sequence.len()`.
    pub rotation_index: usize,
}

impl WorkerState {
    pub fn new(name: impl Into<WorkerId>, rotation_index: usize, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            active: false,
            last_heartbeat: now,
            task_count: 0,
            success_rate: 1.0,
            cost_spent: 0.0,
            cycle_start: None,
            rotation_index,
        }
    }

    /// Time spent in the current active window, zero when the worker has
    /// never been active or the clock went backwards.
    pub fn cycle_age(&self, now: DateTime<Utc>) -> Duration {
        match self.cycle_start {
            Some(start) => non_negative(now - start),
            None => Duration::zero(),
        }
    }

    /// Time since the last liveness signal; a heartbeat stamped in the
    /// future counts as zero.
    pub fn heartbeat_age(&self, now: DateTime<Utc>) -> Duration {
        non_negative(now - self.last_heartbeat)
    }
}

fn non_negative(d: Duration) -> Duration {
    if d < Duration::zero() {
        Duration::zero()
    } else {
        d
    }
}

/// Convert a chrono duration to fractional seconds.
pub fn duration_secs(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => d.num_milliseconds() as f64 / 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn test_new_worker_is_standby_with_perfect_record() {
        let w = WorkerState::new("A", 2, epoch());
        assert!(!w.active);
        assert_eq!(w.rotation_index, 2);
        assert_eq!(w.task_count, 0);
        assert_eq!(w.success_rate, 1.0);
        assert_eq!(w.cost_spent, 0.0);
        assert!(w.cycle_start.is_none());
        assert_eq!(w.last_heartbeat, epoch());
    }

    #[test]
    fn test_cycle_age_without_activation_is_zero() {
        let w = WorkerState::new("A", 0, epoch());
        assert_eq!(w.cycle_age(epoch() + Duration::minutes(5)), Duration::zero());
    }

    #[test]
    fn test_cycle_age_counts_from_cycle_start() {
        let mut w = WorkerState::new("A", 0, epoch());
        w.cycle_start = Some(epoch() + Duration::seconds(10));
        assert_eq!(
            w.cycle_age(epoch() + Duration::seconds(70)),
            Duration::seconds(60)
        );
    }

    #[test]
    fn test_future_heartbeat_counts_as_zero_age() {
        let mut w = WorkerState::new("A", 0, epoch());
        w.last_heartbeat = epoch() + Duration::seconds(30);
        assert_eq!(w.heartbeat_age(epoch()), Duration::zero());
    }

    #[test]
    fn test_duration_secs_keeps_fraction() {
        assert_eq!(duration_secs(Duration::milliseconds(1500)), 1.5);
        assert_eq!(duration_secs(Duration::zero()), 0.0);
    }
}
