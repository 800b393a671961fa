use std::path::Path;

use anyhow::Result;

use conductor_core::OutputFormat;
use conductor_scheduler::{MAX_SCHEDULE_CYCLES, RotationScheduler, ScheduleEntry};

use crate::config_cmds::load_valid_config;

/// Handle `conductor schedule`.
pub(crate) fn handle_schedule(
    positions: Option<usize>,
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_valid_config(cd, explicit)?;
    let scheduler = RotationScheduler::with_system_clock(&config.scheduler)?;
    let positions = positions.unwrap_or_else(|| scheduler.sequence().len());
    let max = scheduler.max_schedule_positions();
    anyhow::ensure!(
        positions <= max,
        "--positions must be at most {max} ({MAX_SCHEDULE_CYCLES} passes through the sequence)"
    );
    let entries = scheduler.rotation_schedule(positions);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "base_cycle_minutes": config.scheduler.base_cycle_minutes,
                "sequence_normalizer": config.scheduler.sequence_normalizer,
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_schedule_text(&entries),
    }
    Ok(())
}

fn print_schedule_text(entries: &[ScheduleEntry]) {
    for entry in entries {
        println!(
            "Position {}: {:.1} minutes (x{}, ends at {:.1} min)",
            entry.position, entry.window_minutes, entry.sequence_value, entry.cumulative_minutes
        );
    }
}
