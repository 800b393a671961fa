use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config_runtime::RuntimeConfig;
use crate::paths;

/// Current schema version for conductor.toml
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// How the active worker is weighted when scoring an assignment.
///
/// `PreferStandby` is the default. With equal scores a fresh scheduler then
/// hands its first task to the next worker in line rather than to the one
/// currently holding the turn. `TurnWindow` counts the active worker as
/// eligible until its window runs out, so on equal scores it keeps the task.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityPolicy {
    /// Only standby workers count as eligible; the active worker is
    /// discounted so idle capacity wins on equal scores.
    #[default]
    PreferStandby,
    /// Standby workers, plus the active worker while its turn has not run out.
    TurnWindow,
}

impl EligibilityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreferStandby => "prefer-standby",
            Self::TurnWindow => "turn-window",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker names; declaration order is the rotation order.
    #[serde(default = "default_worker_names")]
    pub worker_names: Vec<String>,
    /// Rotation multipliers, indexed by each worker's rotation index.
    #[serde(default = "default_duration_sequence")]
    pub duration_sequence: Vec<u64>,
    #[serde(default = "default_base_cycle_minutes")]
    pub base_cycle_minutes: f64,
    /// Sequence value that maps to exactly one base cycle.
    #[serde(default = "default_sequence_normalizer")]
    pub sequence_normalizer: f64,
    /// Per-worker spend at which the cost-efficiency term bottoms out.
    #[serde(default = "default_cost_cap")]
    pub cost_cap: f64,
    /// Heartbeat age at which the recency term bottoms out.
    #[serde(default = "default_stale_window_seconds")]
    pub stale_window_seconds: f64,
    #[serde(default = "default_max_decision_latency_ms")]
    pub max_decision_latency_ms: f64,
    /// Task cost at which the task cost weight bottoms out.
    #[serde(default = "default_task_cost_cap")]
    pub task_cost_cap: f64,
    /// Total budget used for the cost utilization metric.
    #[serde(default = "default_budget_cap")]
    pub budget_cap: f64,
    #[serde(default)]
    pub eligibility: EligibilityPolicy,
}

fn default_worker_names() -> Vec<String> {
    ["AI-Prompt-Manager", "DefuzzyAI", "HyperDagManager"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_duration_sequence() -> Vec<u64> {
    vec![1, 1, 2, 3, 5, 8, 13, 21, 34]
}

fn default_base_cycle_minutes() -> f64 {
    8.0
}

fn default_sequence_normalizer() -> f64 {
    8.0
}

fn default_cost_cap() -> f64 {
    50.0
}

fn default_stale_window_seconds() -> f64 {
    300.0
}

fn default_max_decision_latency_ms() -> f64 {
    200.0
}

fn default_task_cost_cap() -> f64 {
    5.0
}

fn default_budget_cap() -> f64 {
    50.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_names: default_worker_names(),
            duration_sequence: default_duration_sequence(),
            base_cycle_minutes: default_base_cycle_minutes(),
            sequence_normalizer: default_sequence_normalizer(),
            cost_cap: default_cost_cap(),
            stale_window_seconds: default_stale_window_seconds(),
            max_decision_latency_ms: default_max_decision_latency_ms(),
            task_cost_cap: default_task_cost_cap(),
            budget_cap: default_budget_cap(),
            eligibility: EligibilityPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Default settings with a custom worker set.
    pub fn with_workers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            worker_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            scheduler: SchedulerConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Deep merge two TOML values. Overlay wins for non-table values.
/// Tables are merged recursively (project-level keys override user-level keys).
fn merge_toml_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_map), toml::Value::Table(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged_val = match base_map.remove(&key) {
                    Some(base_val) => merge_toml_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged_val);
            }
            toml::Value::Table(base_map)
        }
        (_, overlay) => overlay,
    }
}

impl ConductorConfig {
    /// Load config with fallback chain:
    ///
    /// 1. If both `./conductor.toml` (project) and `~/.config/conductor/conductor.toml` (user)
    ///    exist, deep-merge them with project settings overriding user settings.
    /// 2. If only one exists, use it directly.
    /// 3. If neither exists, use built-in defaults.
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_path = paths::project_config_path(project_root);
        let user_path = paths::user_config_path();
        Ok(Self::load_with_paths(user_path.as_deref(), &project_path)?.unwrap_or_default())
    }

    /// Load config from explicit paths. Testable without global filesystem state.
    pub(crate) fn load_with_paths(
        user_path: Option<&Path>,
        project_path: &Path,
    ) -> Result<Option<Self>> {
        let user_path = user_path.filter(|p| p.exists());
        let project_exists = project_path.exists();

        match (user_path, project_exists) {
            (None, false) => Ok(None),
            (Some(user), false) => Self::load_from_path(user).map(Some),
            (None, true) => Self::load_from_path(project_path).map(Some),
            (Some(user), true) => Self::load_merged(user, project_path).map(Some),
        }
    }

    /// Load a single file, bypassing layering (used for `--config`).
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded conductor config");
        Ok(config)
    }

    /// Deep-merge user config (base) with project config (overlay).
    ///
    /// Uses `max(schema_version)` from both files so that
    /// `check_schema_version()` still catches a too-new user config.
    fn load_merged(base_path: &Path, overlay_path: &Path) -> Result<Self> {
        let base_str = std::fs::read_to_string(base_path)
            .with_context(|| format!("Failed to read user config: {}", base_path.display()))?;
        let overlay_str = std::fs::read_to_string(overlay_path).with_context(|| {
            format!("Failed to read project config: {}", overlay_path.display())
        })?;

        let base_val: toml::Value = toml::from_str(&base_str)
            .with_context(|| format!("Failed to parse user config: {}", base_path.display()))?;
        let overlay_val: toml::Value = toml::from_str(&overlay_str).with_context(|| {
            format!("Failed to parse project config: {}", overlay_path.display())
        })?;

        let base_schema = base_val.get("schema_version").and_then(|v| v.as_integer());
        let overlay_schema = overlay_val
            .get("schema_version")
            .and_then(|v| v.as_integer());

        let mut merged = merge_toml_values(base_val, overlay_val);
        if let Some(max_ver) = match (base_schema, overlay_schema) {
            (Some(b), Some(o)) => Some(b.max(o)),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        } {
            if let toml::Value::Table(ref mut table) = merged {
                table.insert("schema_version".to_string(), toml::Value::Integer(max_ver));
            }
        }

        // Roundtrip through string for reliable deserialization
        let merged_str = toml::to_string(&merged).context("Failed to serialize merged config")?;
        let config: Self =
            toml::from_str(&merged_str).context("Failed to deserialize merged config")?;
        tracing::debug!(
            user = %base_path.display(),
            project = %overlay_path.display(),
            "Merged user and project conductor config"
        );
        Ok(config)
    }

    /// Check if the config schema version is compatible with the current binary.
    pub fn check_schema_version(&self) -> Result<()> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "Config schema version {} is newer than this binary supports (v{}).",
                self.schema_version,
                CURRENT_SCHEMA_VERSION
            );
        }
        Ok(())
    }

    /// Get the project config file path for a project root
    pub fn config_path(project_root: &Path) -> PathBuf {
        paths::project_config_path(project_root)
    }

    /// Write this config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
