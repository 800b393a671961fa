use anyhow::{Result, bail};
use std::path::Path;

use crate::config::ConductorConfig;

/// Write a default `conductor.toml` into `project_root`.
/// Fails if a config already exists there.
pub fn init_project(project_root: &Path) -> Result<ConductorConfig> {
    let config_path = ConductorConfig::config_path(project_root);
    if config_path.exists() {
        bail!("Configuration already exists at {}", config_path.display());
    }

    let config = ConductorConfig::default();
    config.save(&config_path)?;
    tracing::info!(path = %config_path.display(), "Initialized conductor config");
    Ok(config)
}
