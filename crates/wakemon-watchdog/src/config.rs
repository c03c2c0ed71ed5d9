//! Watchdog timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{WakemonError, WakemonResult};

/// Default polling granularity of the loop (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default time between wake-ups (microseconds).
pub const DEFAULT_FIRE_THRESHOLD_US: u64 = 60_000_000;

/// Default delay `start` waits after spawning the loop (milliseconds).
pub const DEFAULT_START_SETTLE_MS: u64 = 10;

/// Default name given to the loop thread.
pub const DEFAULT_THREAD_NAME: &str = "wakemon-watchdog";

/// Smallest stack size accepted for the loop thread (bytes).
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Upper bound on the settle delay (milliseconds).
const MAX_START_SETTLE_MS: u64 = 1_000;

/// Watchdog timer configuration.
///
/// Unset fields fall back to their defaults when deserialized, so a config
/// file only needs to mention what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Loop sleep between elapsed-time checks (milliseconds).
    pub poll_interval_ms: u64,
    /// Elapsed time since the last fire that triggers the next one (microseconds).
    pub fire_threshold_us: u64,
    /// Delay `start` takes after spawning the loop (milliseconds).
    pub start_settle_ms: u64,
    /// Name of the loop thread.
    pub thread_name: String,
    /// Loop thread stack size in bytes; `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fire_threshold_us: DEFAULT_FIRE_THRESHOLD_US,
            start_settle_ms: DEFAULT_START_SETTLE_MS,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

impl WatchdogConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> WakemonResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(WakemonError::invalid_configuration(
                "poll_interval_ms must be greater than 0",
            ));
        }
        if self.fire_threshold_us == 0 {
            return Err(WakemonError::invalid_configuration(
                "fire_threshold_us must be greater than 0",
            ));
        }
        if self.start_settle_ms > MAX_START_SETTLE_MS {
            return Err(WakemonError::invalid_configuration(format!(
                "start_settle_ms must not exceed {MAX_START_SETTLE_MS}"
            )));
        }
        if self.thread_name.trim().is_empty() {
            return Err(WakemonError::invalid_configuration("thread_name must not be empty"));
        }
        if self.thread_name.contains('\0') {
            return Err(WakemonError::invalid_configuration(
                "thread_name must not contain NUL bytes",
            ));
        }
        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(WakemonError::invalid_configuration(format!(
                    "stack_size must be at least {MIN_STACK_SIZE} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Fire threshold as a `Duration`.
    #[must_use]
    pub fn fire_threshold(&self) -> Duration {
        Duration::from_micros(self.fire_threshold_us)
    }

    /// Settle delay as a `Duration`.
    #[must_use]
    pub fn start_settle(&self) -> Duration {
        Duration::from_millis(self.start_settle_ms)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the poll interval in milliseconds.
    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the fire threshold in microseconds.
    #[must_use]
    pub fn fire_threshold_us(mut self, us: u64) -> Self {
        self.config.fire_threshold_us = us;
        self
    }

    /// Set the fire threshold from a `Duration`, saturating at `u64::MAX` microseconds.
    #[must_use]
    pub fn fire_threshold(mut self, threshold: Duration) -> Self {
        self.config.fire_threshold_us = u64::try_from(threshold.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// Set the settle delay in milliseconds.
    #[must_use]
    pub fn start_settle_ms(mut self, ms: u64) -> Self {
        self.config.start_settle_ms = ms;
        self
    }

    /// Set the loop thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the loop thread stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WakemonResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
