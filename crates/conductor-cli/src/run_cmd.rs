use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use conductor_config::ConductorConfig;
use conductor_core::OutputFormat;
use conductor_scheduler::{
    CycleOptions, CycleSummary, IntervalTicker, RotationScheduler, SharedScheduler, VecTaskSource,
    run_cycle,
};

use crate::config_cmds::load_valid_config;
use crate::health_cmd::print_health;
use crate::task_file::tasks_or_demo;

pub(crate) struct RunArgs {
    pub tasks: Option<PathBuf>,
    pub minutes: Option<f64>,
    pub tick_ms: Option<u64>,
    pub health_out: Option<PathBuf>,
}

/// Handle `conductor run`.
pub(crate) async fn handle_run(
    args: RunArgs,
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = load_valid_config(cd, explicit)?;
    apply_overrides(&mut config, &args)?;

    let tasks = tasks_or_demo(args.tasks.as_deref())?;
    let scheduler = RotationScheduler::with_system_clock(&config.scheduler)?;
    let shared = SharedScheduler::new(scheduler);
    let mut ticker = IntervalTicker::new(config.runtime.tick_interval());
    let mut source = VecTaskSource::new(tasks);

    let run_for = chrono::Duration::from_std(config.runtime.run_duration())
        .context("Run duration out of range")?;
    let options = CycleOptions {
        run_for: Some(run_for),
        max_ticks: None,
        stop_when_idle: false,
        health_every_rotations: config.runtime.health_every_rotations,
        max_assign_attempts: config.runtime.max_assign_attempts,
    };
    info!(
        minutes = config.runtime.run_minutes,
        tick_ms = config.runtime.tick_interval_ms,
        queued = source.len(),
        "Starting conductor run"
    );

    let summary = run_cycle(&shared, &mut ticker, &mut source, &options).await?;

    if let Some(path) = &args.health_out {
        let json = serde_json::to_string_pretty(&summary.final_health)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write health report: {}", path.display()))?;
    }
    print_summary(&summary, format)
}

fn apply_overrides(config: &mut ConductorConfig, args: &RunArgs) -> Result<()> {
    if let Some(minutes) = args.minutes {
        anyhow::ensure!(
            minutes.is_finite() && minutes >= 0.0,
            "--minutes must be a non-negative number (got {minutes})"
        );
        config.runtime.run_minutes = minutes;
    }
    if let Some(tick_ms) = args.tick_ms {
        anyhow::ensure!(tick_ms > 0, "--tick-ms must be > 0");
        config.runtime.tick_interval_ms = tick_ms;
    }
    Ok(())
}

fn print_summary(summary: &CycleSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
            Ok(())
        }
        OutputFormat::Text => {
            println!(
                "Run complete: {} ticks, {} rotations, {} assigned, {} rejected, {} dropped",
                summary.ticks,
                summary.rotations,
                summary.assigned,
                summary.rejected,
                summary.dropped
            );
            for a in &summary.assignments {
                println!("  {} -> {}", a.task_id, a.worker);
            }
            println!();
            print_health(&summary.final_health, format)
        }
    }
}
