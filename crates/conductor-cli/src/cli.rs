use std::path::PathBuf;

use clap::{Parser, Subcommand};
use conductor_core::OutputFormat;

#[derive(Parser)]
#[command(name = "conductor")]
#[command(about = "Conductor: rotating task scheduler for a fixed set of workers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Use this config file only, skipping user/project layering
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project directory for config lookup (defaults to CWD)
    #[arg(long, global = true)]
    pub cd: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the autonomous rotation and assignment loop
    Run {
        /// TOML task file ([[tasks]] tables); built-in demo tasks when omitted
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// How long to run, in minutes (overrides runtime.run_minutes)
        #[arg(long)]
        minutes: Option<f64>,

        /// Loop interval in milliseconds (overrides runtime.tick_interval_ms)
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Write the final health report as JSON to this file
        #[arg(long)]
        health_out: Option<PathBuf>,
    },

    /// Assign every task in a file once and report the decisions
    Assign {
        /// TOML task file; built-in demo tasks when omitted
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Score and pick workers without recording assignments
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the rotation window for each sequence position
    Schedule {
        /// Number of positions (defaults to the sequence length)
        #[arg(long)]
        positions: Option<usize>,
    },

    /// Show the health report of a freshly started scheduler
    Health,

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
    /// Write a default conductor.toml into the project directory
    Init,
}
