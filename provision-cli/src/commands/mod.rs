//! Commands module
//!
//! Defines all CLI commands and their handlers. Every handler returns the
//! process exit status it wants the binary to terminate with.

mod config;
mod env;
mod plan;
mod run;

pub use config::ConfigCommands;

use anyhow::Result;
use clap::Subcommand;
use provision_core::domain::stage::StageId;
use provision_runner::Reporter;

use crate::config::Settings;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the provisioning pipeline
    Run {
        /// Resume from this stage; earlier stages are not executed
        #[arg(long)]
        from: Option<StageId>,
    },
    /// Run exactly one stage
    Stage {
        /// Stage name or ordinal (e.g. "engine-package" or 4)
        name: StageId,
    },
    /// List the stages without executing anything
    Plan,
    /// Regenerate the writer environment file
    Env,
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `settings` - The resolved parameter set and runtime configuration
/// * `reporter` - Operator diagnostics
///
/// # Returns
/// The exit status for the process
pub fn handle_command(command: Commands, settings: &Settings, reporter: &Reporter) -> Result<i32> {
    match command {
        Commands::Run { from } => run::handle_run(from, settings, reporter),
        Commands::Stage { name } => run::handle_stage(name, settings, reporter),
        Commands::Plan => plan::handle_plan(),
        Commands::Env => env::handle_env(settings, reporter),
        Commands::Config { command } => config::handle_config_command(command, settings, reporter),
    }
}
