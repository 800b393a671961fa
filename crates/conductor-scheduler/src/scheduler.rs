//! The rotation engine: one active worker at a time, fixed rotation order,
//! score-based task assignment under a decision-latency budget.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use conductor_config::{EligibilityPolicy, SchedulerConfig};
use conductor_core::{
    Clock, RejectReason, SchedulerError, SystemClock, Task, TaskId, TaskStatus, WorkerId,
    WorkerState, duration_secs,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::health::{HealthReport, SystemMetrics, WorkerHealth};
use crate::score;
use crate::sequence::DurationSequence;

/// One worker's standing in an assignment decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub worker: WorkerId,
    pub score: f64,
    pub eligible: bool,
    pub combined: f64,
}

/// Outcome of the scoring phase, before anything is mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub task_id: TaskId,
    pub worker: WorkerId,
    /// Candidates in declaration order.
    pub candidates: Vec<Candidate>,
    pub latency_ms: f64,
    pub decided_at: DateTime<Utc>,
}

/// A completed hand-over from one worker to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationEvent {
    pub from: WorkerId,
    pub to: WorkerId,
    pub rotation_index: usize,
    pub window_minutes: f64,
    pub at: DateTime<Utc>,
}

/// One row of the rotation schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub position: usize,
    pub sequence_value: u64,
    pub window_minutes: f64,
    /// Minutes from the start of the schedule to the end of this window.
    pub cumulative_minutes: f64,
}

/// Full passes through the sequence a rotation schedule may cover.
pub const MAX_SCHEDULE_CYCLES: usize = 16;

#[derive(Debug, Default, Clone)]
struct DecisionStats {
    assigned: u64,
    rejected: u64,
    rotations: u64,
    latency_sum_ms: f64,
    latency_max_ms: f64,
}

pub struct RotationScheduler<C: Clock = SystemClock> {
    config: SchedulerConfig,
    sequence: DurationSequence,
    workers: Vec<WorkerState>,
    by_name: HashMap<WorkerId, usize>,
    active: usize,
    /// Every task id this scheduler has assigned. Entries stay until the
    /// caller hands the finished task back through `release_task`.
    assignments: HashMap<TaskId, WorkerId>,
    stats: DecisionStats,
    started_at: DateTime<Utc>,
    clock: C,
}

impl RotationScheduler<SystemClock> {
    pub fn with_system_clock(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::new(config, SystemClock)
    }
}

impl<C: Clock> RotationScheduler<C> {
    /// Build the worker set from `config`. The first declared worker starts
    /// active; every worker's rotation index is its declaration position.
    pub fn new(config: &SchedulerConfig, clock: C) -> Result<Self, SchedulerError> {
        let sequence = DurationSequence::from_config(config)?;
        for (key, value) in [
            ("cost_cap", config.cost_cap),
            ("stale_window_seconds", config.stale_window_seconds),
            ("max_decision_latency_ms", config.max_decision_latency_ms),
            ("task_cost_cap", config.task_cost_cap),
            ("budget_cap", config.budget_cap),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{key} must be a positive number (got {value})"
                )));
            }
        }
        if config.worker_names.is_empty() {
            return Err(SchedulerError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }

        let now = clock.now();
        let mut workers = Vec::with_capacity(config.worker_names.len());
        let mut by_name = HashMap::with_capacity(config.worker_names.len());
        for (pos, name) in config.worker_names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(SchedulerError::InvalidConfig(
                    "worker names cannot be blank".to_string(),
                ));
            }
            if by_name.insert(name.clone(), pos).is_some() {
                return Err(SchedulerError::InvalidConfig(format!(
                    "duplicate worker name '{name}'"
                )));
            }
            workers.push(WorkerState::new(name.clone(), pos % sequence.len(), now));
        }
        workers[0].active = true;
        workers[0].cycle_start = Some(now);

        info!(
            workers = workers.len(),
            active = %workers[0].name,
            eligibility = config.eligibility.as_str(),
            "Rotation scheduler started"
        );

        Ok(Self {
            config: config.clone(),
            sequence,
            workers,
            by_name,
            active: 0,
            assignments: HashMap::new(),
            stats: DecisionStats::default(),
            started_at: now,
            clock,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sequence(&self) -> &DurationSequence {
        &self.sequence
    }

    /// Workers in declaration (rotation) order.
    pub fn workers(&self) -> &[WorkerState] {
        &self.workers
    }

    pub fn worker(&self, name: &str) -> Option<&WorkerState> {
        self.by_name.get(name).map(|&i| &self.workers[i])
    }

    pub fn active_worker(&self) -> &WorkerState {
        &self.workers[self.active]
    }

    /// Worker a task was assigned to by this scheduler, if any.
    pub fn assignment_of(&self, task_id: &str) -> Option<&WorkerId> {
        self.assignments.get(task_id)
    }

    pub fn compute_score(&self, worker: &str) -> Result<f64, SchedulerError> {
        let now = self.clock.now();
        let w = self.lookup(worker)?;
        Ok(self.score_at(w, now))
    }

    /// Turn length in minutes for a rotation index (wraps modulo the sequence).
    pub fn rotation_duration(&self, rotation_index: usize) -> f64 {
        self.sequence.minutes(rotation_index)
    }

    pub fn rotation_window(&self, rotation_index: usize) -> Duration {
        self.sequence.window(rotation_index)
    }

    /// Score every worker for `task` and pick the best, without mutating
    /// anything. Fails if the scoring took longer than the latency budget.
    pub fn decide(&self, task: &Task) -> Result<Decision, SchedulerError> {
        let started = self.clock.now();

        let priority_weight = score::priority_weight(task.priority);
        let cost_weight = score::task_cost_weight(task.estimated_cost, self.config.task_cost_cap);
        let mut candidates = Vec::with_capacity(self.workers.len());
        let mut best: Option<(usize, f64)> = None;
        for (i, w) in self.workers.iter().enumerate() {
            let eligible = self.is_eligible(w, started);
            let score = self.score_at(w, started);
            let combined =
                score * score::eligibility_weight(eligible) * priority_weight * cost_weight;
            // Strict comparison keeps the first maximum.
            if best.is_none_or(|(_, top)| combined > top) {
                best = Some((i, combined));
            }
            candidates.push(Candidate {
                worker: w.name.clone(),
                score,
                eligible,
                combined,
            });
        }

        let elapsed_ms = duration_secs(self.clock.now() - started).max(0.0) * 1000.0;
        let budget_ms = self.config.max_decision_latency_ms;
        if elapsed_ms > budget_ms {
            return Err(SchedulerError::AssignmentRejected {
                task_id: task.id.clone(),
                reason: RejectReason::LatencyBudgetExceeded {
                    elapsed_ms,
                    budget_ms,
                },
            });
        }

        let winner = best.map(|(i, _)| i).unwrap_or(self.active);
        debug!(
            task = %task.id,
            worker = %self.workers[winner].name,
            latency_ms = elapsed_ms,
            "Assignment decided"
        );
        Ok(Decision {
            task_id: task.id.clone(),
            worker: self.workers[winner].name.clone(),
            candidates,
            latency_ms: elapsed_ms,
            decided_at: started,
        })
    }

    /// Assign a pending task to the best-scoring worker.
    ///
    /// Each task is assigned at most once: a task that is not pending, or
    /// whose id this scheduler already assigned, is refused without any
    /// state change. A latency rejection leaves the task pending.
    pub fn assign_task(&mut self, task: &mut Task) -> Result<WorkerId, SchedulerError> {
        self.assign_task_detailed(task).map(|decision| decision.worker)
    }

    /// Same as [`Self::assign_task`], returning the full decision.
    pub fn assign_task_detailed(&mut self, task: &mut Task) -> Result<Decision, SchedulerError> {
        if let Some(worker) = self.assignments.get(&task.id) {
            return Err(SchedulerError::TaskAlreadyAssigned {
                task_id: task.id.clone(),
                worker: worker.clone(),
            });
        }
        if !task.is_pending() {
            return Err(SchedulerError::TaskAlreadyAssigned {
                task_id: task.id.clone(),
                worker: task
                    .assigned_worker
                    .clone()
                    .unwrap_or_else(|| "<unknown>".to_string()),
            });
        }

        let decision = match self.decide(task) {
            Ok(decision) => decision,
            Err(err) => {
                if err.is_retryable() {
                    self.stats.rejected += 1;
                    warn!(task = %task.id, error = %err, "Assignment rejected");
                }
                return Err(err);
            }
        };

        let idx = self.by_name[&decision.worker];
        let winner = &mut self.workers[idx];
        winner.task_count += 1;
        winner.last_heartbeat = decision.decided_at;

        task.assigned_worker = Some(decision.worker.clone());
        task.status = TaskStatus::Assigned;
        self.assignments
            .insert(task.id.clone(), decision.worker.clone());

        self.stats.assigned += 1;
        self.stats.latency_sum_ms += decision.latency_ms;
        self.stats.latency_max_ms = self.stats.latency_max_ms.max(decision.latency_ms);

        info!(
            task = %task.id,
            worker = %decision.worker,
            priority = task.priority,
            latency_ms = decision.latency_ms,
            "Task assigned"
        );
        Ok(decision)
    }

    /// Forget the assignment record of a task that reached a terminal state.
    ///
    /// Returns the worker it was assigned to, or `None` if the task is still
    /// live or was never assigned here. A released id can no longer be
    /// recognised as a duplicate, so only release tasks that are done.
    pub fn release_task(&mut self, task: &Task) -> Option<WorkerId> {
        if !task.status.is_terminal() {
            return None;
        }
        let worker = self.assignments.remove(&task.id)?;
        debug!(
            task = %task.id,
            worker = %worker,
            status = task.status.as_str(),
            "Task released"
        );
        Some(worker)
    }

    /// Rotate if the active worker's window has run out. See [`Self::tick_at`].
    pub fn tick(&mut self) -> Option<RotationEvent> {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// Rotate at most one step. Windows that elapsed entirely between calls
    /// are skipped, not replayed.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<RotationEvent> {
        let current = &self.workers[self.active];
        let window = self.sequence.window(current.rotation_index);
        if current.cycle_age(now) < window {
            return None;
        }

        let from = current.name.clone();
        self.workers[self.active].active = false;

        let next = (self.active + 1) % self.workers.len();
        let len = self.sequence.len();
        let incoming = &mut self.workers[next];
        incoming.active = true;
        incoming.cycle_start = Some(now);
        incoming.rotation_index = (incoming.rotation_index + 1) % len;
        let rotation_index = incoming.rotation_index;
        let to = incoming.name.clone();

        self.active = next;
        self.stats.rotations += 1;

        let window_minutes = self.sequence.minutes(rotation_index);
        info!(
            from = %from,
            worker = %to,
            rotation_index,
            window_minutes,
            "Rotated active worker"
        );
        Some(RotationEvent {
            from,
            to,
            rotation_index,
            window_minutes,
            at: now,
        })
    }

    /// Record a liveness signal and optional metrics for `worker`.
    ///
    /// `success_rate` is clamped into `[0, 1]`. `cost_spent` is a running
    /// total and never moves backwards. Non-finite values are ignored.
    pub fn report_heartbeat(
        &mut self,
        worker: &str,
        success_rate: Option<f64>,
        cost_spent: Option<f64>,
    ) -> Result<(), SchedulerError> {
        let now = self.clock.now();
        let idx = *self
            .by_name
            .get(worker)
            .ok_or_else(|| SchedulerError::InvalidWorkerReference(worker.to_string()))?;
        let w = &mut self.workers[idx];
        w.last_heartbeat = now;

        if let Some(rate) = success_rate {
            if rate.is_finite() {
                w.success_rate = rate.clamp(0.0, 1.0);
            } else {
                warn!(worker, value = rate, "Ignoring non-finite success rate");
            }
        }
        if let Some(cost) = cost_spent {
            if cost.is_finite() {
                if cost < w.cost_spent {
                    debug!(
                        worker,
                        reported = cost,
                        current = w.cost_spent,
                        "Cost report below running total, keeping total"
                    );
                }
                w.cost_spent = w.cost_spent.max(cost.max(0.0));
            } else {
                warn!(worker, value = cost, "Ignoring non-finite cost");
            }
        }
        debug!(
            worker,
            success_rate = w.success_rate,
            cost_spent = w.cost_spent,
            "Heartbeat recorded"
        );
        Ok(())
    }

    pub fn health_snapshot(&self) -> HealthReport {
        let now = self.clock.now();
        let workers = self
            .workers
            .iter()
            .map(|w| WorkerHealth {
                name: w.name.clone(),
                active: w.active,
                score: self.score_at(w, now),
                task_count: w.task_count,
                success_rate: w.success_rate,
                cost_spent: w.cost_spent,
                rotation_index: w.rotation_index,
                window_minutes: self.sequence.minutes(w.rotation_index),
                cycle_age_secs: duration_secs(w.cycle_age(now)),
                heartbeat_age_secs: duration_secs(w.heartbeat_age(now)),
            })
            .collect::<Vec<_>>();

        let total_cost: f64 = self.workers.iter().map(|w| w.cost_spent).sum();
        let avg_latency = if self.stats.assigned == 0 {
            0.0
        } else {
            self.stats.latency_sum_ms / self.stats.assigned as f64
        };

        HealthReport {
            timestamp: now,
            uptime_secs: duration_secs(now - self.started_at).max(0.0),
            active_worker: self.workers[self.active].name.clone(),
            workers,
            metrics: SystemMetrics {
                total_tasks_assigned: self.stats.assigned,
                rotation_count: self.stats.rotations,
                rejected_assignments: self.stats.rejected,
                avg_decision_latency_ms: avg_latency,
                max_decision_latency_ms: self.stats.latency_max_ms,
                total_cost_spent: total_cost,
                cost_utilization: total_cost / self.config.budget_cap,
            },
        }
    }

    /// Largest number of positions `rotation_schedule` returns.
    pub fn max_schedule_positions(&self) -> usize {
        self.sequence.len().saturating_mul(MAX_SCHEDULE_CYCLES)
    }

    /// Windows for the first `positions` sequence positions, capped at
    /// [`Self::max_schedule_positions`].
    pub fn rotation_schedule(&self, positions: usize) -> Vec<ScheduleEntry> {
        let mut cumulative = 0.0;
        (0..positions.min(self.max_schedule_positions()))
            .map(|position| {
                let window_minutes = self.sequence.minutes(position);
                cumulative += window_minutes;
                ScheduleEntry {
                    position,
                    sequence_value: self.sequence.value(position),
                    window_minutes,
                    cumulative_minutes: cumulative,
                }
            })
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<&WorkerState, SchedulerError> {
        self.worker(name)
            .ok_or_else(|| SchedulerError::InvalidWorkerReference(name.to_string()))
    }

    fn score_at(&self, worker: &WorkerState, now: DateTime<Utc>) -> f64 {
        score::performance_score(
            worker,
            now,
            self.config.cost_cap,
            self.config.stale_window_seconds,
        )
    }

    fn is_eligible(&self, worker: &WorkerState, now: DateTime<Utc>) -> bool {
        if !worker.active {
            return true;
        }
        match self.config.eligibility {
            EligibilityPolicy::PreferStandby => false,
            EligibilityPolicy::TurnWindow => {
                worker.cycle_age(now) < self.sequence.window(worker.rotation_index)
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
