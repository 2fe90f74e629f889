//! Config command handlers
//!
//! Shows and validates the effective parameter set and runtime
//! configuration. Secrets are masked unless explicitly requested.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use provision_core::domain::params::ParameterSet;
use provision_runner::{Config, Reporter};
use serde::Serialize;

use crate::config::Settings;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Emit JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Print passwords in clear text
        #[arg(long)]
        show_secrets: bool,
    },
    /// Validate the effective configuration
    Check,
}

#[derive(Serialize)]
struct Effective<'a> {
    parameters: &'a ParameterSet,
    runtime: &'a Config,
}

/// Handle config commands
pub fn handle_config_command(
    command: ConfigCommands,
    settings: &Settings,
    reporter: &Reporter,
) -> Result<i32> {
    match command {
        ConfigCommands::Show { json, show_secrets } => show(settings, json, show_secrets),
        ConfigCommands::Check => Ok(check(settings, reporter)),
    }
}

fn show(settings: &Settings, json: bool, show_secrets: bool) -> Result<i32> {
    let params = if show_secrets {
        settings.params.clone()
    } else {
        settings.params.redacted()
    };

    if json {
        let effective = Effective {
            parameters: &params,
            runtime: &settings.config,
        };
        let rendered =
            serde_json::to_string_pretty(&effective).context("Failed to serialize configuration")?;
        println!("{}", rendered);
    } else {
        print_summary(&params, &settings.config);
    }

    Ok(provision_core::error::EXIT_SUCCESS)
}

fn print_summary(params: &ParameterSet, config: &Config) {
    println!("{}", "Instance".bold());
    println!("    SID:            {}", params.sid);
    println!("    Global name:    {}", params.global_db_name);
    println!("    Pluggable:      {}", params.topology.pdb_name);
    println!("    Character set:  {}", params.character_set);
    println!("    Connect:        {}", params.dsn().dimmed());
    println!("    SYSTEM:         {}", params.credentials.system_password);
    println!();
    println!("{}", "Service account".bold());
    println!(
        "    User:           {}:{}",
        params.service_account.name, params.service_account.group
    );
    println!("    Home:           {}", params.service_account.home.display());
    println!("    Install root:   {}", params.layout.install_root.display());
    println!("    Engine home:    {}", params.layout.engine_home.display());
    println!();
    println!("{}", "Runtime".bold());
    println!("    Package tool:   {}", config.package_manager);
    println!(
        "    Engine package: {}",
        config.engine_package_path().display()
    );
    println!("    Writer dir:     {}", config.writer_dir.display());
    println!("    Manifest:       {}", config.manifest_path().display());
    println!("    Runtime:        {}", config.runtime_program());
}

fn check(settings: &Settings, reporter: &Reporter) -> i32 {
    match settings.params.validate() {
        Ok(()) => {
            reporter.success(None, "Configuration is valid");
            provision_core::error::EXIT_SUCCESS
        }
        Err(err) => {
            reporter.error(None, err.to_string());
            err.exit_code()
        }
    }
}
