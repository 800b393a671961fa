//! Point-in-time health report, produced by `RotationScheduler::health_snapshot`.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerHealth {
    pub name: String,
    pub active: bool,
    pub score: f64,
    pub task_count: u64,
    pub success_rate: f64,
    pub cost_spent: f64,
    pub rotation_index: usize,
    /// Length of the window this worker gets (or has) at its current index.
    pub window_minutes: f64,
    pub cycle_age_secs: f64,
    pub heartbeat_age_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    pub total_tasks_assigned: u64,
    pub rotation_count: u64,
    pub rejected_assignments: u64,
    pub avg_decision_latency_ms: f64,
    pub max_decision_latency_ms: f64,
    pub total_cost_spent: f64,
    /// `total_cost_spent / budget_cap`.
    pub cost_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: f64,
    pub active_worker: String,
    pub workers: Vec<WorkerHealth>,
    pub metrics: SystemMetrics,
}

impl HealthReport {
    /// Single-line summary for periodic log output.
    pub fn summary(&self) -> String {
        format!(
            "active={} assigned={} rotations={} rejected={} avg_latency={:.3}ms cost_utilization={:.1}%",
            self.active_worker,
            self.metrics.total_tasks_assigned,
            self.metrics.rotation_count,
            self.metrics.rejected_assignments,
            self.metrics.avg_decision_latency_ms,
            self.metrics.cost_utilization * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> HealthReport {
        HealthReport {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            uptime_secs: 12.0,
            active_worker: "B".into(),
            workers: vec![WorkerHealth {
                name: "B".into(),
                active: true,
                score: 0.9,
                task_count: 4,
                success_rate: 0.8,
                cost_spent: 5.0,
                rotation_index: 2,
                window_minutes: 2.0,
                cycle_age_secs: 12.0,
                heartbeat_age_secs: 1.0,
            }],
            metrics: SystemMetrics {
                total_tasks_assigned: 4,
                rotation_count: 1,
                rejected_assignments: 0,
                avg_decision_latency_ms: 0.0126,
                max_decision_latency_ms: 0.03,
                total_cost_spent: 5.0,
                cost_utilization: 0.1,
            },
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            report().summary(),
            "active=B assigned=4 rotations=1 rejected=0 avg_latency=0.013ms cost_utilization=10.0%"
        );
    }

    #[test]
    fn test_serializes_nested_metrics() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["active_worker"], "B");
        assert_eq!(json["workers"][0]["rotation_index"], 2);
        assert_eq!(json["metrics"]["total_tasks_assigned"], 4);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }
}
