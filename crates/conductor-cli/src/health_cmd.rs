use std::path::Path;

use anyhow::Result;

use conductor_core::OutputFormat;
use conductor_scheduler::{HealthReport, RotationScheduler};

use crate::config_cmds::load_valid_config;

/// Handle `conductor health`.
pub(crate) fn handle_health(
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_valid_config(cd, explicit)?;
    let scheduler = RotationScheduler::with_system_clock(&config.scheduler)?;
    print_health(&scheduler.health_snapshot(), format)
}

pub(crate) fn print_health(report: &HealthReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print_health_text(report),
    }
    Ok(())
}

fn print_health_text(report: &HealthReport) {
    println!(
        "Health at {} (uptime {:.0}s)",
        report.timestamp.to_rfc3339(),
        report.uptime_secs
    );
    println!(
        "{:<8} {:<20} {:>6} {:>6} {:>8} {:>8} {:>5} {:>10}",
        "STATUS", "WORKER", "SCORE", "TASKS", "SUCCESS", "COST", "IDX", "WINDOW(m)"
    );
    for w in &report.workers {
        println!(
            "{:<8} {:<20} {:>6.3} {:>6} {:>8.2} {:>8.2} {:>5} {:>10.1}",
            if w.active { "ACTIVE" } else { "standby" },
            w.name,
            w.score,
            w.task_count,
            w.success_rate,
            w.cost_spent,
            w.rotation_index,
            w.window_minutes
        );
    }
    let m = &report.metrics;
    println!();
    println!("Tasks assigned:    {}", m.total_tasks_assigned);
    println!("Rotations:         {}", m.rotation_count);
    println!("Rejected:          {}", m.rejected_assignments);
    println!(
        "Decision latency:  avg {:.3}ms, max {:.3}ms",
        m.avg_decision_latency_ms, m.max_decision_latency_ms
    );
    println!("Cost utilization:  {:.1}%", m.cost_utilization * 100.0);
}
