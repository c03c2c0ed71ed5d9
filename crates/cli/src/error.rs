//! Error types for wakemonctl

use std::path::PathBuf;
use thiserror::Error;
use wakemon_watchdog::WakemonError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported config format for {0} (expected .json, .yaml or .yml)")]
    UnsupportedConfigFormat(PathBuf),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Watchdog failed to start")]
    StartFailed,

    #[error(transparent)]
    Watchdog(#[from] WakemonError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigRead { .. }
            | CliError::UnsupportedConfigFormat(_)
            | CliError::JsonError(_)
            | CliError::YamlError(_) => 2,
            CliError::Watchdog(WakemonError::InvalidConfiguration(_)) => 3,
            CliError::StartFailed | CliError::Watchdog(WakemonError::SpawnFailed(_)) => 4,
            CliError::Watchdog(WakemonError::ActionFailed { .. }) | CliError::IoError(_) => 1,
        }
    }
}
