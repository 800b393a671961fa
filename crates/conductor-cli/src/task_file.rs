//! Task input files.
//!
//! ```toml
//! [[tasks]]
//! id = "video-generation"      # optional, a ULID is generated when absent
//! priority = 95
//! estimated_cost = 0.25
//! estimated_duration_secs = 30 # optional
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use conductor_core::Task;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskEntry {
    id: Option<String>,
    priority: u32,
    #[serde(default)]
    estimated_cost: f64,
    #[serde(default)]
    estimated_duration_secs: f64,
}

pub(crate) fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file: {}", path.display()))?;
    parse_tasks(&content, Utc::now())
        .with_context(|| format!("Invalid task file: {}", path.display()))
}

pub(crate) fn parse_tasks(content: &str, now: DateTime<Utc>) -> Result<Vec<Task>> {
    let file: TaskFile = toml::from_str(content).context("Failed to parse tasks")?;
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(file.tasks.len());

    for (i, entry) in file.tasks.into_iter().enumerate() {
        for (key, value) in [
            ("estimated_cost", entry.estimated_cost),
            ("estimated_duration_secs", entry.estimated_duration_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("tasks[{i}].{key} must be a non-negative number (got {value})");
            }
        }
        let task = match entry.id {
            Some(id) if id.trim().is_empty() => bail!("tasks[{i}].id cannot be blank"),
            Some(id) => Task::new(
                id,
                entry.priority,
                entry.estimated_cost,
                entry.estimated_duration_secs,
                now,
            ),
            None => Task::with_generated_id(
                entry.priority,
                entry.estimated_cost,
                entry.estimated_duration_secs,
                now,
            ),
        };
        if !seen.insert(task.id.clone()) {
            bail!("tasks[{i}]: duplicate task id '{}'", task.id);
        }
        tasks.push(task);
    }
    Ok(tasks)
}

/// Sample workload used when no task file is given.
pub(crate) fn demo_tasks(now: DateTime<Utc>) -> Vec<Task> {
    [
        ("video-generation", 95, 0.25, 30.0),
        ("blockchain-deploy", 90, 0.0, 120.0),
        ("content-analysis", 85, 0.0, 15.0),
        ("cost-optimization", 80, 0.5, 45.0),
        ("hackathon-search", 75, 0.0, 60.0),
    ]
    .into_iter()
    .map(|(id, priority, cost, secs)| Task::new(id, priority, cost, secs, now))
    .collect()
}

/// Tasks from `path`, or the demo workload.
pub(crate) fn tasks_or_demo(path: Option<&Path>) -> Result<Vec<Task>> {
    match path {
        Some(path) => load_tasks(path),
        None => Ok(demo_tasks(Utc::now())),
    }
}
