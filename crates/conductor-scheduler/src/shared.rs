//! Thread-safe handle for schedulers with more than one caller.
//!
//! Mutations (`assign_task`, `tick`, `report_heartbeat`) hold the write lock;
//! reads (`compute_score`, `decide`, `health_snapshot`) hold the read lock,
//! so a reader never observes a half-applied assignment or rotation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use conductor_core::{Clock, SchedulerError, SystemClock, Task, WorkerId};

use crate::health::HealthReport;
use crate::scheduler::{Decision, RotationEvent, RotationScheduler};

pub struct SharedScheduler<C: Clock = SystemClock> {
    inner: Arc<RwLock<RotationScheduler<C>>>,
}

impl<C: Clock> Clone for SharedScheduler<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock> SharedScheduler<C> {
    pub fn new(scheduler: RotationScheduler<C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scheduler)),
        }
    }

    pub fn assign_task(&self, task: &mut Task) -> Result<WorkerId, SchedulerError> {
        self.write()?.assign_task(task)
    }

    pub fn assign_task_detailed(&self, task: &mut Task) -> Result<Decision, SchedulerError> {
        self.write()?.assign_task_detailed(task)
    }

    pub fn release_task(&self, task: &Task) -> Result<Option<WorkerId>, SchedulerError> {
        Ok(self.write()?.release_task(task))
    }

    pub fn tick(&self) -> Result<Option<RotationEvent>, SchedulerError> {
        Ok(self.write()?.tick())
    }

    pub fn report_heartbeat(
        &self,
        worker: &str,
        success_rate: Option<f64>,
        cost_spent: Option<f64>,
    ) -> Result<(), SchedulerError> {
        self.write()?
            .report_heartbeat(worker, success_rate, cost_spent)
    }

    pub fn compute_score(&self, worker: &str) -> Result<f64, SchedulerError> {
        self.read()?.compute_score(worker)
    }

    pub fn decide(&self, task: &Task) -> Result<Decision, SchedulerError> {
        self.read()?.decide(task)
    }

    pub fn health_snapshot(&self) -> Result<HealthReport, SchedulerError> {
        Ok(self.read()?.health_snapshot())
    }

    /// Current time on the scheduler's clock.
    pub fn now(&self) -> Result<DateTime<Utc>, SchedulerError> {
        Ok(self.read()?.clock().now())
    }

    /// Run `f` against the scheduler under the read lock.
    pub fn with_read<T>(
        &self,
        f: impl FnOnce(&RotationScheduler<C>) -> T,
    ) -> Result<T, SchedulerError> {
        let guard = self.read()?;
        Ok(f(&guard))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RotationScheduler<C>>, SchedulerError> {
        self.inner.read().map_err(|_| SchedulerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RotationScheduler<C>>, SchedulerError> {
        self.inner.write().map_err(|_| SchedulerError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_config::SchedulerConfig;
    use conductor_core::ManualClock;
    use std::thread;

    fn shared() -> SharedScheduler<ManualClock> {
        let config = SchedulerConfig::with_workers(["A", "B", "C"]);
        SharedScheduler::new(RotationScheduler::new(&config, ManualClock::at_epoch()).unwrap())
    }

    #[test]
    fn test_parallel_submitters_assign_each_task_once() {
        let handle = shared();
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let mut task = Task::new(
                            format!("t{t}-{i}"),
                            80,
                            0.5,
                            10.0,
                            DateTime::<Utc>::UNIX_EPOCH,
                        );
                        handle.assign_task(&mut task).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let report = handle.health_snapshot().unwrap();
        assert_eq!(report.metrics.total_tasks_assigned, 400);
        let per_worker: u64 = report.workers.iter().map(|w| w.task_count).sum();
        assert_eq!(per_worker, 400);
    }

    #[test]
    fn test_same_task_from_two_threads_is_assigned_once() {
        let handle = shared();
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                thread::spawn(move || {
                    let mut task = Task::new("dup", 90, 0.0, 1.0, DateTime::<Utc>::UNIX_EPOCH);
                    handle.assign_task(&mut task).is_ok()
                })
            })
            .collect();
        let successes = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_poisoned_lock_surfaces_as_error() {
        let handle = shared();
        let poisoner = handle.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the scheduler lock");
        })
        .join();

        let err = handle.health_snapshot().unwrap_err();
        assert!(matches!(err, SchedulerError::LockPoisoned));
        assert!(handle.tick().is_err());
    }

    #[test]
    fn test_with_read_exposes_accessors() {
        let handle = shared();
        let active = handle
            .with_read(|s| s.active_worker().name.clone())
            .unwrap();
        assert_eq!(active, "A");
        assert!((handle.compute_score("B").unwrap() - 1.0).abs() < 1e-12);
    }
}
