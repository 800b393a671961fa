use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use conductor_config::{ConductorConfig, init_project, validate_config};
use conductor_core::OutputFormat;

pub(crate) fn determine_project_root(cd: Option<&str>) -> Result<PathBuf> {
    match cd {
        Some(dir) => {
            let path = PathBuf::from(dir);
            anyhow::ensure!(path.is_dir(), "Not a directory: {}", path.display());
            Ok(path)
        }
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Effective config: an explicit `--config` file, otherwise the layered
/// user + project config, otherwise defaults.
pub(crate) fn load_config(cd: Option<&str>, explicit: Option<&Path>) -> Result<ConductorConfig> {
    match explicit {
        Some(path) => ConductorConfig::load_from_path(path),
        None => {
            let project_root = determine_project_root(cd)?;
            ConductorConfig::load(&project_root)
        }
    }
}

/// Load and validate; every command that builds a scheduler goes through here.
pub(crate) fn load_valid_config(
    cd: Option<&str>,
    explicit: Option<&Path>,
) -> Result<ConductorConfig> {
    let config = load_config(cd, explicit)?;
    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

pub(crate) fn handle_config_show(
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(cd, explicit)?;
    match format {
        OutputFormat::Json => {
            let json_str = serde_json::to_string_pretty(&config)?;
            println!("{}", json_str);
        }
        OutputFormat::Text => {
            let toml_str = toml::to_string_pretty(&config)?;
            print!("{}", toml_str);
        }
    }
    Ok(())
}

pub(crate) fn handle_config_validate(
    cd: Option<&str>,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(cd, explicit)?;
    let result = validate_config(&config);
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": result.is_ok(),
                "error": result.as_ref().err().map(|e| e.to_string()),
                "workers": config.scheduler.worker_names,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if result.is_ok() {
                println!(
                    "Configuration is valid ({} workers, eligibility: {})",
                    config.scheduler.worker_names.len(),
                    config.scheduler.eligibility.as_str()
                );
            }
        }
    }
    result
}

pub(crate) fn handle_config_init(cd: Option<&str>) -> Result<()> {
    let project_root = determine_project_root(cd)?;
    let config = init_project(&project_root)?;
    eprintln!(
        "Initialized configuration at: {}",
        ConductorConfig::config_path(&project_root).display()
    );
    eprintln!("Workers: {}", config.scheduler.worker_names.join(", "));
    Ok(())
}
