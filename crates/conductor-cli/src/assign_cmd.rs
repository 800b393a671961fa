use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use conductor_core::OutputFormat;
use conductor_scheduler::RotationScheduler;

use crate::config_cmds::load_valid_config;
use crate::task_file::tasks_or_demo;

#[derive(Debug, Serialize)]
struct AssignmentRow {
    task: String,
    priority: u32,
    worker: Option<String>,
    latency_ms: Option<f64>,
    error: Option<String>,
}

/// Handle `conductor assign`.
pub(crate) fn handle_assign(
    tasks: Option<&Path>,
    dry_run: bool,
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_valid_config(cd, explicit)?;
    let mut scheduler = RotationScheduler::with_system_clock(&config.scheduler)?;
    let tasks = tasks_or_demo(tasks)?;

    let mut rows = Vec::with_capacity(tasks.len());
    for mut task in tasks {
        let outcome = if dry_run {
            scheduler.decide(&task)
        } else {
            scheduler.assign_task_detailed(&mut task)
        };
        let row = match outcome {
            Ok(decision) => AssignmentRow {
                task: task.id,
                priority: task.priority,
                worker: Some(decision.worker),
                latency_ms: Some(decision.latency_ms),
                error: None,
            },
            Err(e) => {
                warn!(task = %task.id, error = %e, "Task not assigned");
                AssignmentRow {
                    task: task.id,
                    priority: task.priority,
                    worker: None,
                    latency_ms: None,
                    error: Some(e.to_string()),
                }
            }
        };
        rows.push(row);
    }

    let latencies: Vec<f64> = rows.iter().filter_map(|r| r.latency_ms).collect();
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    let max = latencies.iter().copied().fold(0.0_f64, f64::max);
    let budget = config.scheduler.max_decision_latency_ms;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dry_run": dry_run,
                "assignments": rows,
                "avg_latency_ms": avg,
                "max_latency_ms": max,
                "budget_ms": budget,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for row in &rows {
                match (&row.worker, row.latency_ms) {
                    (Some(worker), Some(latency)) => {
                        println!("Task: {} -> {} ({:.3}ms)", row.task, worker, latency)
                    }
                    _ => println!(
                        "Task: {} -> rejected: {}",
                        row.task,
                        row.error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
            println!();
            println!("Average: {:.3}ms", avg);
            println!("Maximum: {:.3}ms", max);
            println!(
                "Within {:.0}ms budget: {}",
                budget,
                if max < budget { "yes" } else { "no" }
            );
        }
    }
    Ok(())
}
