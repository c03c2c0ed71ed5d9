//! Error types for the wake-up watchdog.
//!
//! `start`/`stop` never fail from the caller's point of view; these errors
//! come out of configuration validation and out of action executors, whose
//! failures the loop logs and counts.

use thiserror::Error;

/// Errors that can occur while configuring or driving the watchdog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WakemonError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operating system refused to spawn the loop thread.
    #[error("Failed to spawn watchdog thread: {0}")]
    SpawnFailed(String),

    /// A wake-up action could not be carried out.
    #[error("Wake-up action '{action}' failed: {reason}")]
    ActionFailed {
        /// Name of the action that failed.
        action: String,
        /// The reason for the failure.
        reason: String,
    },
}

impl WakemonError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a spawn failure error.
    #[must_use]
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed(reason.into())
    }

    /// Create an action failure error.
    #[must_use]
    pub fn action_failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WakemonResult<T> = std::result::Result<T, WakemonError>;
