use anyhow::{Result, bail};
use std::collections::HashSet;

use crate::config::{ConductorConfig, SchedulerConfig};
use crate::config_runtime::RuntimeConfig;

/// Validate a loaded configuration.
/// Returns Ok(()) if valid, or Err with a descriptive message for the first problem.
pub fn validate_config(config: &ConductorConfig) -> Result<()> {
    config.check_schema_version()?;
    validate_workers(&config.scheduler)?;
    validate_sequence(&config.scheduler)?;
    validate_knobs(&config.scheduler)?;
    validate_runtime(&config.runtime)?;
    Ok(())
}

fn validate_workers(config: &SchedulerConfig) -> Result<()> {
    if config.worker_names.is_empty() {
        bail!("scheduler.worker_names cannot be empty");
    }
    let mut seen = HashSet::new();
    for name in &config.worker_names {
        if name.trim().is_empty() {
            bail!("scheduler.worker_names contains a blank name");
        }
        if !seen.insert(name.as_str()) {
            bail!("scheduler.worker_names contains duplicate '{}'", name);
        }
    }
    Ok(())
}

fn validate_sequence(config: &SchedulerConfig) -> Result<()> {
    let seq = &config.duration_sequence;
    if seq.is_empty() {
        bail!("scheduler.duration_sequence cannot be empty");
    }
    if let Some(pos) = seq.iter().position(|v| *v == 0) {
        bail!(
            "scheduler.duration_sequence[{}] must be > 0 (got 0)",
            pos
        );
    }
    if let Some(pos) = seq.windows(2).position(|w| w[1] < w[0]) {
        bail!(
            "scheduler.duration_sequence must be non-decreasing ({} at index {} follows {})",
            seq[pos + 1],
            pos + 1,
            seq[pos]
        );
    }
    Ok(())
}

fn validate_knobs(config: &SchedulerConfig) -> Result<()> {
    let knobs = [
        ("base_cycle_minutes", config.base_cycle_minutes),
        ("sequence_normalizer", config.sequence_normalizer),
        ("cost_cap", config.cost_cap),
        ("stale_window_seconds", config.stale_window_seconds),
        ("max_decision_latency_ms", config.max_decision_latency_ms),
        ("task_cost_cap", config.task_cost_cap),
        ("budget_cap", config.budget_cap),
    ];
    for (key, value) in knobs {
        if !value.is_finite() || value <= 0.0 {
            bail!("scheduler.{} must be a positive number (got {})", key, value);
        }
    }
    Ok(())
}

fn validate_runtime(config: &RuntimeConfig) -> Result<()> {
    if config.tick_interval_ms == 0 {
        bail!("runtime.tick_interval_ms must be > 0 (got 0)");
    }
    if !config.run_minutes.is_finite() || config.run_minutes < 0.0 {
        bail!(
            "runtime.run_minutes must be a non-negative number (got {})",
            config.run_minutes
        );
    }
    if config.max_assign_attempts == 0 {
        bail!("runtime.max_assign_attempts must be >= 1 (got 0)");
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
