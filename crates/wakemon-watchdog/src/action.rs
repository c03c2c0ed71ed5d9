//! Wake-up actions.
//!
//! The loop only knows how to call [`WakeAction::fire`]. The production
//! action is [`BroadcastAction`], which launches `am broadcast` and does not
//! wait for it; [`LogAction`] and [`RecordingAction`] stand in for it in dry
//! runs and tests.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::error::{WakemonError, WakemonResult};

/// Intent action the monitoring receiver listens for.
pub const DEFAULT_WAKE_UP_ACTION: &str = "bo.htakey.rimic.RimicWakeUpMon.WAKE_UP_ACTION_MON";

/// Activity manager binary used to send broadcasts.
pub const DEFAULT_BROADCAST_PROGRAM: &str = "am";

/// Something the watchdog does when the threshold elapses.
///
/// Implementations must not block for long: the loop calls `fire` inline.
/// Returned errors are logged and counted by the loop, never retried.
pub trait WakeAction: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Perform the action.
    ///
    /// # Errors
    ///
    /// Returns an error if the action could not be started.
    fn fire(&self) -> WakemonResult<()>;
}

impl<F> WakeAction for F
where
    F: Fn() -> WakemonResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn fire(&self) -> WakemonResult<()> {
        self()
    }
}

/// Broadcast parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Program that sends the broadcast.
    pub program: String,
    /// Intent action string.
    pub action: String,
    /// Target Android user id.
    pub user: u32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_BROADCAST_PROGRAM.to_string(),
            action: DEFAULT_WAKE_UP_ACTION.to_string(),
            user: 0,
        }
    }
}

impl BroadcastConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the program or action is empty or contains whitespace.
    pub fn validate(&self) -> WakemonResult<()> {
        if self.program.trim().is_empty() {
            return Err(WakemonError::invalid_configuration(
                "broadcast program must not be empty",
            ));
        }
        if self.action.is_empty() || self.action.chars().any(char::is_whitespace) {
            return Err(WakemonError::invalid_configuration(
                "broadcast action must be a non-empty token without whitespace",
            ));
        }
        Ok(())
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "broadcast".to_string(),
            "-a".to_string(),
            self.action.clone(),
            "--user".to_string(),
            self.user.to_string(),
        ]
    }

    /// The full command line, e.g. `am broadcast -a <action> --user 0`.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// Sends the wake-up broadcast through the activity manager.
///
/// The child process is not waited on. The previous child is reaped without
/// blocking on the next fire, so at most one unreaped child exists.
#[derive(Debug)]
pub struct BroadcastAction {
    config: BroadcastConfig,
    last_child: Mutex<Option<Child>>,
}

impl BroadcastAction {
    /// Create a broadcast action.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: BroadcastConfig) -> WakemonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            last_child: Mutex::new(None),
        })
    }

    /// The broadcast parameters.
    #[must_use]
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// The command line this action runs.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.config.command_line()
    }

    fn reap_previous(slot: &mut Option<Child>) {
        if let Some(child) = slot.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::trace!(
                        target: crate::LOG_TARGET,
                        %status,
                        "previous broadcast finished"
                    );
                    *slot = None;
                }
                Ok(None) => {
                    tracing::debug!(
                        target: crate::LOG_TARGET,
                        pid = child.id(),
                        "previous broadcast still running"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        target: crate::LOG_TARGET,
                        error = %e,
                        "could not poll previous broadcast"
                    );
                    *slot = None;
                }
            }
        }
    }
}

impl Default for BroadcastAction {
    fn default() -> Self {
        Self {
            config: BroadcastConfig::default(),
            last_child: Mutex::new(None),
        }
    }
}

impl WakeAction for BroadcastAction {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn fire(&self) -> WakemonResult<()> {
        let mut slot = self.last_child.lock();
        Self::reap_previous(&mut slot);

        let child = Command::new(&self.config.program)
            .args(self.config.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| WakemonError::action_failed(self.name(), e.to_string()))?;

        tracing::debug!(
            target: crate::LOG_TARGET,
            pid = child.id(),
            command = %self.config.command_line(),
            "broadcast sent"
        );

        // A still-running previous child is left to the OS; keep the newest.
        *slot = Some(child);
        Ok(())
    }
}

/// Logs the broadcast it would send instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogAction {
    config: BroadcastConfig,
}

impl LogAction {
    /// Create a logging action describing `config`.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self { config }
    }
}

impl WakeAction for LogAction {
    fn name(&self) -> &str {
        "log"
    }

    fn fire(&self) -> WakemonResult<()> {
        tracing::info!(
            target: crate::LOG_TARGET,
            command = %self.config.command_line(),
            "wake up (dry run)"
        );
        Ok(())
    }
}

/// Counts fires and records when they happened.
///
/// Intended as a test double for the broadcast action.
#[derive(Debug, Default)]
pub struct RecordingAction {
    fires: AtomicU64,
    fail: AtomicBool,
    instants: Mutex<Vec<Instant>>,
}

impl RecordingAction {
    /// Create a recording action that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording action whose every call fails (after being recorded).
    #[must_use]
    pub fn failing() -> Self {
        let action = Self::default();
        action.fail.store(true, Ordering::Release);
        action
    }

    /// Number of calls to `fire`.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.fires.load(Ordering::Acquire)
    }

    /// Instants of every call to `fire`, oldest first.
    #[must_use]
    pub fn fire_instants(&self) -> Vec<Instant> {
        self.instants.lock().clone()
    }

    /// Make subsequent calls succeed or fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Release);
    }
}

impl WakeAction for RecordingAction {
    fn name(&self) -> &str {
        "recording"
    }

    fn fire(&self) -> WakemonResult<()> {
        self.instants.lock().push(Instant::now());
        self.fires.fetch_add(1, Ordering::AcqRel);
        if self.fail.load(Ordering::Acquire) {
            return Err(WakemonError::action_failed(self.name(), "configured to fail"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_line() {
        let config = BroadcastConfig::default();
        assert_eq!(
            config.command_line(),
            "am broadcast -a bo.htakey.rimic.RimicWakeUpMon.WAKE_UP_ACTION_MON --user 0"
        );
    }

    #[test]
    fn test_custom_command_line() {
        let config = BroadcastConfig {
            action: "com.example.PING".to_string(),
            user: 10,
            ..Default::default()
        };
        assert_eq!(config.command_line(), "am broadcast -a com.example.PING --user 10");
    }

    #[test]
    fn test_broadcast_config_validation() {
        let config = BroadcastConfig {
            action: "two words".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(BroadcastAction::new(config).is_err());

        let config = BroadcastConfig {
            program: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_program_reports_action_failure() -> WakemonResult<()> {
        let action = BroadcastAction::new(BroadcastConfig {
            program: "/nonexistent/wakemon-am".to_string(),
            ..Default::default()
        })?;
        let result = action.fire();
        assert!(matches!(result, Err(WakemonError::ActionFailed { .. })));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_broadcast_spawns_program() -> WakemonResult<()> {
        let action = BroadcastAction::new(BroadcastConfig {
            program: "true".to_string(),
            ..Default::default()
        })?;
        assert_eq!(action.config().program, "true");
        assert_eq!(
            action.command_line(),
            "true broadcast -a bo.htakey.rimic.RimicWakeUpMon.WAKE_UP_ACTION_MON --user 0"
        );
        action.fire()?;
        // The second fire reaps (or leaves) the first child without blocking.
        action.fire()?;
        Ok(())
    }

    #[test]
    fn test_recording_action() {
        let action = RecordingAction::new();
        assert!(action.fire().is_ok());
        assert!(action.fire().is_ok());
        assert_eq!(action.fire_count(), 2);
        assert_eq!(action.fire_instants().len(), 2);

        action.set_failing(true);
        assert!(action.fire().is_err());
        assert_eq!(action.fire_count(), 3);
    }

    #[test]
    fn test_closure_action() {
        let action = || -> WakemonResult<()> { Ok(()) };
        assert_eq!(WakeAction::name(&action), "closure");
        assert!(WakeAction::fire(&action).is_ok());
    }

    #[test]
    fn test_log_action_always_succeeds() {
        assert!(LogAction::default().fire().is_ok());
    }
}
