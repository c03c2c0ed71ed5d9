//! Layered configuration: defaults, then an optional file, then flags.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::Path;

use wakemon_watchdog::{BroadcastConfig, WatchdogConfig};

use crate::error::CliError;

/// Everything `wakemonctl` needs to build a watchdog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watchdog: WatchdogConfig,
    pub broadcast: BroadcastConfig,
}

/// Flag values that override the file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Time between wake-ups in milliseconds
    #[arg(long, value_name = "MS")]
    pub threshold_ms: Option<u64>,

    /// Program used to send the broadcast
    #[arg(long)]
    pub program: Option<String>,

    /// Intent action to broadcast
    #[arg(long)]
    pub action: Option<String>,

    /// Android user id the broadcast targets
    #[arg(long)]
    pub user: Option<u32>,
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            _ => return Err(CliError::UnsupportedConfigFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(settings)
    }

    /// Apply flag overrides on top of the loaded settings.
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(ms) = overrides.poll_interval_ms {
            self.watchdog.poll_interval_ms = ms;
        }
        if let Some(ms) = overrides.threshold_ms {
            self.watchdog.fire_threshold_us = ms.saturating_mul(1_000);
        }
        if let Some(program) = &overrides.program {
            self.broadcast.program.clone_from(program);
        }
        if let Some(action) = &overrides.action {
            self.broadcast.action.clone_from(action);
        }
        if let Some(user) = overrides.user {
            self.broadcast.user = user;
        }
        self
    }

    /// Validate both sections.
    pub fn validate(&self) -> Result<(), CliError> {
        self.watchdog.validate()?;
        self.broadcast.validate()?;
        Ok(())
    }
}
