//! Scheduler configuration loading and validation (conductor.toml).

pub mod config;
pub mod config_runtime;
pub mod init;
pub mod paths;
pub mod validate;

pub use config::{CURRENT_SCHEMA_VERSION, ConductorConfig, EligibilityPolicy, SchedulerConfig};
pub use config_runtime::RuntimeConfig;
pub use init::init_project;
pub use validate::validate_config;
