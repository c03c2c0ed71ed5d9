//! wakemonctl - wakemon watchdog runner
//!
//! Starts the wake-up watchdog with settings taken from defaults, an optional
//! config file and command-line flags, and reports what it did.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::RunArgs;
use crate::error::CliError;
use crate::settings::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "wakemonctl")]
#[command(about = "Wake-up watchdog - periodically broadcasts a wake-up intent")]
#[command(version)]
#[command(long_about = "
wakemonctl runs a background watchdog that sends
`am broadcast -a <action> --user <id>` once per threshold (60 s by default)
until it is stopped.

Settings come from built-in defaults, then --config (JSON or YAML), then flags.
Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (.json, .yaml or .yml)
    #[arg(long, global = true, env = "WAKEMON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watchdog
    Run(RunArgs),

    /// Show the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,

        /// Print as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("wakemon={log_level},wakemonctl={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli).await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => {
            let settings = Settings::load(cli.config.as_deref())?;
            commands::run::execute(args, settings, cli.json).await
        }
        Commands::Config { overrides, yaml } => {
            let settings = Settings::load(cli.config.as_deref())?;
            commands::config::execute(settings, overrides, cli.json, *yaml)
        }
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}
