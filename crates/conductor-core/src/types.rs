use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

pub type TaskId = String;
pub type WorkerId = String;

/// Lifecycle of a task.
///
/// The scheduler only ever moves `Pending -> Assigned`. Terminal states are
/// set by whoever executes the task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Assigned,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of work submitted by a task source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Worker chosen by the scheduler; `None` while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_worker: Option<WorkerId>,
    /// Higher is more urgent. 100 is treated as full weight.
    pub priority: u32,
    pub estimated_cost: f64,
    pub estimated_duration_secs: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        priority: u32,
        estimated_cost: f64,
        estimated_duration_secs: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            assigned_worker: None,
            priority,
            estimated_cost: estimated_cost.max(0.0),
            estimated_duration_secs: estimated_duration_secs.max(0.0),
            created_at,
            status: TaskStatus::Pending,
        }
    }

    /// Build a task with a freshly generated ULID.
    pub fn with_generated_id(
        priority: u32,
        estimated_cost: f64,
        estimated_duration_secs: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            ulid::Ulid::new().to_string(),
            priority,
            estimated_cost,
            estimated_duration_secs,
            created_at,
        )
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Mark an assigned task as finished successfully.
    pub fn complete(&mut self) -> Result<(), SchedulerError> {
        self.finish(TaskStatus::Completed)
    }

    /// Mark an assigned task as failed.
    pub fn fail(&mut self) -> Result<(), SchedulerError> {
        self.finish(TaskStatus::Failed)
    }

    fn finish(&mut self, to: TaskStatus) -> Result<(), SchedulerError> {
        if self.status != TaskStatus::Assigned {
            return Err(SchedulerError::InvalidTaskTransition {
                task_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task::new("video-generation", 95, 0.25, 30.0, DateTime::<Utc>::UNIX_EPOCH)
    }

    #[test]
    fn test_new_task_is_pending_and_unassigned() {
        let task = sample_task();
        assert!(task.is_pending());
        assert!(task.assigned_worker.is_none());
    }

    #[test]
    fn test_new_task_clamps_negative_estimates() {
        let task = Task::new("t", 10, -3.0, -1.0, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(task.estimated_cost, 0.0);
        assert_eq!(task.estimated_duration_secs, 0.0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Task::with_generated_id(50, 0.0, 0.0, Utc::now());
        let b = Task::with_generated_id(50, 0.0, 0.0, Utc::now());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 26);
    }

    #[test]
    fn test_complete_requires_assignment() {
        let mut task = sample_task();
        let err = task.complete().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidTaskTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Completed,
                ..
            }
        ));
        assert!(task.is_pending());
    }

    #[test]
    fn test_assigned_task_can_complete_or_fail() {
        let mut done = sample_task();
        done.status = TaskStatus::Assigned;
        done.complete().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.status.is_terminal());

        let mut failed = sample_task();
        failed.status = TaskStatus::Assigned;
        failed.fail().unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
    }

    #[test]
    fn test_terminal_task_cannot_finish_twice() {
        let mut task = sample_task();
        task.status = TaskStatus::Assigned;
        task.complete().unwrap();
        assert!(task.fail().is_err());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_task_status_serde_is_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Assigned).unwrap();
        assert_eq!(json, "\"assigned\"");
        let parsed: TaskStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Failed);
    }

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Pending.to_string(), "pending");
        assert_eq!(TaskStatus::Assigned.to_string(), "assigned");
        assert_eq!(TaskStatus::Completed.to_string(), "completed");
        assert_eq!(TaskStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_pending_task_json_omits_worker() {
        let value = serde_json::to_value(sample_task()).unwrap();
        assert!(value.get("assigned_worker").is_none());
        assert_eq!(value["status"], "pending");
    }
}
