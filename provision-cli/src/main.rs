//! Provision CLI
//!
//! Command-line interface for the single-node database provisioning pipeline.

mod commands;
mod config;

use clap::Parser;
use commands::{Commands, handle_command};
use config::{Overrides, Settings};
use provision_runner::Reporter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "provision")]
#[command(about = "Provision a single-node database and hand off to its writer", long_about = None)]
struct Cli {
    /// JSON document overriding the built-in parameter set
    #[arg(long, global = true, env = "PROVISION_PARAMS")]
    params: Option<PathBuf>,

    /// Directory holding the engine package
    #[arg(long, global = true)]
    media_dir: Option<PathBuf>,

    /// Working directory of the downstream writer
    #[arg(long, global = true)]
    writer_dir: Option<PathBuf>,

    /// Guest-integration installer to run in stage 2
    #[arg(long, global = true)]
    guest_additions: Option<PathBuf>,

    /// Shell profile to install for the service account
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Enable debug tracing on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reporter = Reporter::console();

    let overrides = Overrides {
        params_file: cli.params,
        media_dir: cli.media_dir,
        writer_dir: cli.writer_dir,
        guest_additions: cli.guest_additions,
        profile: cli.profile,
    };

    let status = match Settings::load(&overrides)
        .and_then(|settings| handle_command(cli.command, &settings, &reporter))
    {
        Ok(status) => status,
        Err(e) => {
            reporter.error(None, format!("{:#}", e));
            provision_core::error::EXIT_GENERIC
        }
    };

    ExitCode::from(u8::try_from(status).unwrap_or(1))
}

/// Initializes tracing on stderr so stdout carries only diagnostics
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "provision_cli=debug,provision_runner=debug"
    } else {
        "provision_cli=warn,provision_runner=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
