use anyhow::Result;
use clap::Parser;

mod assign_cmd;
mod cli;
mod config_cmds;
mod health_cmd;
mod run_cmd;
mod schedule_cmd;
mod task_file;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let format = cli.format.clone();
    let cd = cli.cd.as_deref();
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            tasks,
            minutes,
            tick_ms,
            health_out,
        } => {
            let args = run_cmd::RunArgs {
                tasks,
                minutes,
                tick_ms,
                health_out,
            };
            run_cmd::handle_run(args, cd, explicit, format).await?;
        }
        Commands::Assign { tasks, dry_run } => {
            assign_cmd::handle_assign(tasks.as_deref(), dry_run, cd, explicit, format)?;
        }
        Commands::Schedule { positions } => {
            schedule_cmd::handle_schedule(positions, cd, explicit, format)?;
        }
        Commands::Health => {
            health_cmd::handle_health(cd, explicit, format)?;
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config_cmds::handle_config_show(cd, explicit, format)?,
            ConfigCommands::Validate => {
                config_cmds::handle_config_validate(cd, explicit, format)?
            }
            ConfigCommands::Init => config_cmds::handle_config_init(cd)?,
        },
    }

    Ok(())
}
