//! The autonomous cycle: on every tick, rotate if due and hand one pending
//! task to the scheduler.

use std::collections::VecDeque;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use conductor_core::{Clock, ManualClock, SchedulerError, Task, TaskId, WorkerId};
use serde::Serialize;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::health::HealthReport;
use crate::shared::SharedScheduler;

/// Paces the driving loop.
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next iteration is due.
    async fn tick(&mut self);
}

/// Wall-clock ticker backed by `tokio::time::interval`.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: StdDuration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Advances a [`ManualClock`] by a fixed step per tick, without sleeping.
pub struct ManualTicker {
    clock: ManualClock,
    step: Duration,
}

impl ManualTicker {
    pub fn new(clock: ManualClock, step: Duration) -> Self {
        Self { clock, step }
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        self.clock.advance(self.step);
    }
}

/// Where the loop pulls new work from.
pub trait TaskSource: Send {
    fn next_task(&mut self) -> Option<Task>;
}

/// Preloaded FIFO queue of tasks.
#[derive(Debug, Default)]
pub struct VecTaskSource {
    queue: VecDeque<Task>,
}

impl VecTaskSource {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            queue: tasks.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl TaskSource for VecTaskSource {
    fn next_task(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }
}

#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// Stop once this much scheduler-clock time has passed. `None` runs unbounded.
    pub run_for: Option<Duration>,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Stop as soon as the source is drained and no task is waiting for a retry.
    pub stop_when_idle: bool,
    /// Log a health summary every N rotations; 0 disables it.
    pub health_every_rotations: u64,
    /// Attempts per task before a repeatedly rejected task is dropped.
    pub max_assign_attempts: u32,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            run_for: None,
            max_ticks: None,
            stop_when_idle: false,
            health_every_rotations: 10,
            max_assign_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub worker: WorkerId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub ticks: u64,
    pub rotations: u64,
    pub assigned: u64,
    /// Rejections, counting every failed attempt.
    pub rejected: u64,
    /// Tasks given up on.
    pub dropped: u64,
    pub assignments: Vec<Assignment>,
    pub final_health: HealthReport,
}

struct HeldTask {
    task: Task,
    attempts: u32,
}

/// Drive `shared` until a stop condition in `options` is met.
///
/// Per-tick failures are logged and the loop carries on. Only a poisoned
/// scheduler lock ends the run early.
pub async fn run_cycle<C, T, S>(
    shared: &SharedScheduler<C>,
    ticker: &mut T,
    source: &mut S,
    options: &CycleOptions,
) -> Result<CycleSummary, SchedulerError>
where
    C: Clock,
    T: Ticker + ?Sized,
    S: TaskSource + ?Sized,
{
    let started = shared.now()?;
    let mut summary = Counters::default();
    let mut held: Option<HeldTask> = None;
    let mut drained = false;

    info!(
        run_for_secs = options.run_for.map(|d| d.num_seconds()),
        max_ticks = options.max_ticks,
        "Autonomous cycle started"
    );

    loop {
        if let Some(max) = options.max_ticks {
            if summary.ticks >= max {
                break;
            }
        }
        if let Some(run_for) = options.run_for {
            if shared.now()? - started >= run_for {
                break;
            }
        }
        if options.stop_when_idle && drained && held.is_none() {
            break;
        }

        ticker.tick().await;
        summary.ticks += 1;

        match shared.tick() {
            Ok(Some(event)) => {
                summary.rotations += 1;
                debug!(from = %event.from, worker = %event.to, "Cycle observed rotation");
                if options.health_every_rotations > 0
                    && summary.rotations % options.health_every_rotations == 0
                {
                    let report = shared.health_snapshot()?;
                    info!(health = %report.summary(), "Periodic health");
                }
            }
            Ok(None) => {}
            Err(SchedulerError::LockPoisoned) => return Err(SchedulerError::LockPoisoned),
            Err(err) => warn!(error = %err, "Rotation check failed"),
        }

        let next = match held.take() {
            Some(h) => Some(h),
            None => match source.next_task() {
                Some(task) => Some(HeldTask { task, attempts: 0 }),
                None => {
                    drained = true;
                    None
                }
            },
        };
        let Some(mut pending) = next else {
            continue;
        };

        match shared.assign_task(&mut pending.task) {
            Ok(worker) => {
                summary.assigned += 1;
                summary.assignments.push(Assignment {
                    task_id: pending.task.id.clone(),
                    worker,
                });
            }
            Err(SchedulerError::LockPoisoned) => return Err(SchedulerError::LockPoisoned),
            Err(err) if err.is_retryable() => {
                summary.rejected += 1;
                pending.attempts += 1;
                if pending.attempts >= options.max_assign_attempts {
                    summary.dropped += 1;
                    error!(
                        task = %pending.task.id,
                        attempts = pending.attempts,
                        "Dropping task after repeated rejections"
                    );
                } else {
                    debug!(task = %pending.task.id, attempts = pending.attempts, "Retrying task next tick");
                    held = Some(pending);
                }
            }
            Err(err) => {
                summary.dropped += 1;
                warn!(task = %pending.task.id, error = %err, "Skipping task");
            }
        }
    }

    let final_health = shared.health_snapshot()?;
    info!(
        ticks = summary.ticks,
        rotations = summary.rotations,
        assigned = summary.assigned,
        dropped = summary.dropped,
        "Autonomous cycle completed"
    );
    Ok(CycleSummary {
        ticks: summary.ticks,
        rotations: summary.rotations,
        assigned: summary.assigned,
        rejected: summary.rejected,
        dropped: summary.dropped,
        assignments: summary.assignments,
        final_health,
    })
}

#[derive(Default)]
struct Counters {
    ticks: u64,
    rotations: u64,
    assigned: u64,
    rejected: u64,
    dropped: u64,
    assignments: Vec<Assignment>,
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
