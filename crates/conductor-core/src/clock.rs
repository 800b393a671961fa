//! Time source seam. The scheduler never reads the wall clock directly.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    step: Duration,
}

/// Deterministic clock for tests and simulations.
///
/// Clones share the same underlying time, so a test can keep a handle and
/// advance the clock while the scheduler owns another. An optional step is
/// added after every read, which lets tests make any measured interval
/// arbitrarily long.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                step: Duration::zero(),
            })),
        }
    }

    /// Clock starting at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.lock().now = to;
    }

    /// Advance by `step` after every `now()` read. Zero disables it.
    pub fn set_auto_step(&self, step: Duration) {
        self.lock().step = step;
    }

    /// Current time without triggering the auto step.
    pub fn peek(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // Plain data, safe to recover from poisoning.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut state = self.lock();
        let now = state.now;
        let step = state.step;
        state.now += step;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::at_epoch();
        assert_eq!(clock.now(), clock.now());
        clock.advance(Duration::seconds(90));
        assert_eq!(
            clock.now(),
            DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(90)
        );
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::at_epoch();
        let handle = clock.clone();
        handle.advance(Duration::minutes(3));
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(3));
    }

    #[test]
    fn test_auto_step_advances_after_each_read() {
        let clock = ManualClock::at_epoch();
        clock.set_auto_step(Duration::milliseconds(250));
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second - first, Duration::milliseconds(250));
        assert_eq!(clock.peek(), first + Duration::milliseconds(500));
    }

    #[test]
    fn test_set_overrides_current_time() {
        let clock = ManualClock::at_epoch();
        let target = DateTime::<Utc>::UNIX_EPOCH + Duration::days(1);
        clock.set(target);
        assert_eq!(clock.peek(), target);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
