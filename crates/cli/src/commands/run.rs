//! `run`: drive the watchdog until interrupted or for a fixed time

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use wakemon_watchdog::{BroadcastAction, LogAction, WakeAction, Watchdog};

use crate::error::CliError;
use crate::output;
use crate::settings::{Overrides, Settings};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Log the broadcast instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECS")]
    pub for_secs: Option<u64>,

    /// Diagnostic value passed to start (logged only)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub x: i32,

    /// Diagnostic value passed to start (logged only)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub y: i32,
}

/// Extra time, on top of one poll interval, allowed for the loop to exit.
const STOP_GRACE: Duration = Duration::from_secs(1);

pub async fn execute(args: &RunArgs, settings: Settings, json: bool) -> Result<()> {
    let settings = settings.apply(&args.overrides);
    settings.validate()?;

    let action: Arc<dyn WakeAction> = if args.dry_run {
        Arc::new(LogAction::new(settings.broadcast.clone()))
    } else {
        Arc::new(BroadcastAction::new(settings.broadcast.clone()).map_err(CliError::from)?)
    };

    let watchdog =
        Arc::new(Watchdog::new(settings.watchdog.clone(), action).map_err(CliError::from)?);

    if !watchdog.start(args.x, args.y) {
        return Err(CliError::StartFailed.into());
    }

    if !json {
        output::print_run_started(&settings, args.dry_run);
    }

    match args.for_secs {
        Some(secs) => {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(secs)) => {
                    tracing::info!(secs, "run time elapsed");
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(CliError::from)?;
                    tracing::info!("interrupted");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await.map_err(CliError::from)?;
            tracing::info!("interrupted");
        }
    }

    watchdog.stop();

    let timeout = settings.watchdog.poll_interval() + STOP_GRACE;
    let waiter = Arc::clone(&watchdog);
    let stopped = tokio::task::spawn_blocking(move || waiter.wait_stopped(timeout)).await?;
    if !stopped {
        tracing::warn!(?timeout, "watchdog loop did not exit in time");
    }

    output::print_stats(&watchdog.stats(), json);
    Ok(())
}
