use crate::types::{TaskId, TaskStatus, WorkerId};

/// Why an assignment decision was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The scoring loop ran longer than the configured decision budget.
    LatencyBudgetExceeded { elapsed_ms: f64, budget_ms: f64 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatencyBudgetExceeded {
                elapsed_ms,
                budget_ms,
            } => write!(
                f,
                "decision took {elapsed_ms:.2}ms, budget is {budget_ms:.2}ms"
            ),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("Assignment of task '{task_id}' rejected: {reason}")]
    AssignmentRejected {
        task_id: TaskId,
        reason: RejectReason,
    },

    #[error("Unknown worker '{0}'")]
    InvalidWorkerReference(WorkerId),

    #[error("Task '{task_id}' is already assigned to '{worker}'")]
    TaskAlreadyAssigned { task_id: TaskId, worker: WorkerId },

    #[error("Task '{task_id}' cannot move from {from} to {to}")]
    InvalidTaskTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("Scheduler lock poisoned")]
    LockPoisoned,
}

impl SchedulerError {
    /// True when the caller may retry the same call later with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AssignmentRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_assignment_rejected() {
        let err = SchedulerError::AssignmentRejected {
            task_id: "t1".into(),
            reason: RejectReason::LatencyBudgetExceeded {
                elapsed_ms: 250.0,
                budget_ms: 200.0,
            },
        };
        assert_eq!(
            err.to_string(),
            "Assignment of task 't1' rejected: decision took 250.00ms, budget is 200.00ms"
        );
    }

    #[test]
    fn test_display_invalid_worker_reference() {
        let err = SchedulerError::InvalidWorkerReference("ghost".into());
        assert_eq!(err.to_string(), "Unknown worker 'ghost'");
    }

    #[test]
    fn test_display_task_already_assigned() {
        let err = SchedulerError::TaskAlreadyAssigned {
            task_id: "t1".into(),
            worker: "B".into(),
        };
        assert_eq!(err.to_string(), "Task 't1' is already assigned to 'B'");
    }

    #[test]
    fn test_display_invalid_task_transition() {
        let err = SchedulerError::InvalidTaskTransition {
            task_id: "t9".into(),
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Task 't9' cannot move from pending to completed"
        );
    }

    #[test]
    fn test_display_invalid_config() {
        let err = SchedulerError::InvalidConfig("worker_names is empty".into());
        assert_eq!(
            err.to_string(),
            "Invalid scheduler configuration: worker_names is empty"
        );
    }

    #[test]
    fn test_display_lock_poisoned() {
        assert_eq!(
            SchedulerError::LockPoisoned.to_string(),
            "Scheduler lock poisoned"
        );
    }

    #[test]
    fn test_only_rejections_are_retryable() {
        let rejected = SchedulerError::AssignmentRejected {
            task_id: "t1".into(),
            reason: RejectReason::LatencyBudgetExceeded {
                elapsed_ms: 1.0,
                budget_ms: 0.5,
            },
        };
        assert!(rejected.is_retryable());
        assert!(!SchedulerError::InvalidWorkerReference("x".into()).is_retryable());
        assert!(!SchedulerError::LockPoisoned.is_retryable());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchedulerError>();
    }
}
