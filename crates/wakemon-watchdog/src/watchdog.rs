//! The wake-up watchdog.
//!
//! A single detached thread sleeps for the poll interval, measures elapsed
//! wall-clock time since it started, and fires the wake-up action whenever a
//! full threshold has passed since the previous fire. `start` and `stop` only
//! flip atomic flags; the loop notices a stop within one poll interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::LOG_TARGET;
use crate::action::WakeAction;
use crate::clock::{Clock, SystemClock};
use crate::config::WatchdogConfig;
use crate::error::{WakemonError, WakemonResult};
use crate::stats::{Counters, WatchdogStats};
use crate::timer::WakeTimer;

/// Granularity of [`Watchdog::wait_stopped`] polling.
const STOP_POLL: Duration = Duration::from_millis(5);

/// State shared between the owner and the loop thread.
struct Shared {
    /// Run-state: set by `start`, cleared when the loop exits.
    running: AtomicBool,
    /// Loop-control: cleared by `stop`, polled by the loop.
    keep_looping: AtomicBool,
    /// Held by the one loop thread allowed to run.
    loop_active: AtomicBool,
    counters: Counters,
    action: Arc<dyn WakeAction>,
    clock: Box<dyn Clock>,
}

/// Clears the loop flags when the loop thread leaves, even by unwinding.
struct ActiveLoop<'a> {
    shared: &'a Shared,
}

impl Drop for ActiveLoop<'_> {
    fn drop(&mut self) {
        self.shared.loop_active.store(false, Ordering::Release);
        self.shared.running.store(false, Ordering::Release);
        tracing::info!(target: LOG_TARGET, running = false, "watchdog stopped");
    }
}

/// Periodic wake-up watchdog.
///
/// Owned by the host application. Every method takes `&self`, so the
/// watchdog can sit in an `Arc` and be started and stopped from any thread.
/// Dropping it requests a stop; the loop thread exits on its next poll.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wakemon_watchdog::prelude::*;
///
/// let config = WatchdogConfig::builder()
///     .poll_interval_ms(5)
///     .fire_threshold(Duration::from_millis(20))
///     .build()?;
/// let action = Arc::new(RecordingAction::new());
/// let watchdog = Watchdog::new(config, action.clone())?;
///
/// assert!(watchdog.start(0, 0));
/// std::thread::sleep(Duration::from_millis(100));
/// watchdog.stop();
/// assert!(watchdog.wait_stopped(Duration::from_secs(1)));
/// assert!(action.fire_count() >= 1);
/// # Ok::<(), wakemon_watchdog::WakemonError>(())
/// ```
pub struct Watchdog {
    config: WatchdogConfig,
    shared: Arc<Shared>,
}

impl Watchdog {
    /// Create a watchdog reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WatchdogConfig, action: Arc<dyn WakeAction>) -> WakemonResult<Self> {
        Self::with_clock(config, action, SystemClock)
    }

    /// Create a watchdog with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(
        config: WatchdogConfig,
        action: Arc<dyn WakeAction>,
        clock: impl Clock + 'static,
    ) -> WakemonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                keep_looping: AtomicBool::new(false),
                loop_active: AtomicBool::new(false),
                counters: Counters::default(),
                action,
                clock: Box::new(clock),
            }),
        })
    }

    /// Start the watchdog loop.
    ///
    /// `x` and `y` are diagnostic context and only appear in logs. If the
    /// watchdog is already running this is a no-op that returns the current
    /// run-state. Otherwise the loop thread is spawned detached, the caller
    /// waits the configured settle delay, and the run-state is returned.
    ///
    /// Returns `false` if the loop thread could not be spawned.
    pub fn start(&self, x: i32, y: i32) -> bool {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let running = self.shared.running.load(Ordering::Acquire);
            tracing::info!(target: LOG_TARGET, x, y, running, "watchdog already running");
            return running;
        }

        tracing::info!(target: LOG_TARGET, x, y, "starting watchdog");
        self.shared.keep_looping.store(true, Ordering::Release);

        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let shared = Arc::clone(&self.shared);
        let poll_interval = self.config.poll_interval();
        let threshold_us = self.config.fire_threshold_us;

        match builder.spawn(move || run_loop(&shared, poll_interval, threshold_us)) {
            // Dropping the handle detaches the thread.
            Ok(_detached) => self.shared.counters.record_start(),
            Err(e) => {
                let error = WakemonError::spawn_failed(e.to_string());
                tracing::error!(target: LOG_TARGET, %error, "watchdog not started");
                self.shared.keep_looping.store(false, Ordering::Release);
                self.shared.running.store(false, Ordering::Release);
                return false;
            }
        }

        thread::sleep(self.config.start_settle());

        let running = self.shared.running.load(Ordering::Acquire);
        tracing::info!(target: LOG_TARGET, running, "watchdog start requested");
        running
    }

    /// Ask the loop to stop.
    ///
    /// Never blocks. Returns the run-state as seen now, which stays `true`
    /// until the loop wakes from its current sleep and exits.
    pub fn stop(&self) -> bool {
        self.shared.keep_looping.store(false, Ordering::Release);
        let running = self.shared.running.load(Ordering::Acquire);
        tracing::info!(target: LOG_TARGET, running, "stopping watchdog");
        running
    }

    /// Block until the run-state clears or `timeout` passes.
    ///
    /// Returns `true` if the watchdog is stopped. Does not request a stop.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        while self.is_running() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }
            thread::sleep(STOP_POLL);
        }
        true
    }

    /// Whether the watchdog is logically active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether a loop thread is currently iterating.
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.shared.loop_active.load(Ordering::Acquire)
    }

    /// Snapshot of the watchdog counters.
    #[must_use]
    pub fn stats(&self) -> WatchdogStats {
        self.shared
            .counters
            .snapshot(self.is_running(), self.is_looping())
    }

    /// The configuration this watchdog was built with.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Name of the configured wake-up action.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.shared.action.name()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shared.keep_looping.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("config", &self.config)
            .field("action", &self.shared.action.name())
            .field("running", &self.is_running())
            .field("looping", &self.is_looping())
            .finish()
    }
}

fn run_loop(shared: &Shared, poll_interval: Duration, threshold_us: u64) {
    if shared
        .loop_active
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        tracing::debug!(target: LOG_TARGET, "watchdog loop already active");
        return;
    }
    let _active = ActiveLoop { shared };
    shared.counters.record_loop_entry();
    tracing::info!(target: LOG_TARGET, running = true, "watchdog started");

    let reference = shared.clock.now();
    let mut timer = WakeTimer::new(threshold_us);

    while shared.keep_looping.load(Ordering::Acquire) {
        thread::sleep(poll_interval);
        if !shared.keep_looping.load(Ordering::Acquire) {
            break;
        }
        shared.counters.record_tick();

        let elapsed_us = shared.clock.now().elapsed_micros_since(reference);
        if !timer.poll(elapsed_us) {
            continue;
        }

        let ok = match shared.action.fire() {
            Ok(()) => {
                tracing::debug!(
                    target: LOG_TARGET,
                    action = shared.action.name(),
                    elapsed_us,
                    "wake-up fired"
                );
                true
            }
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, elapsed_us, "wake-up action failed");
                false
            }
        };
        shared.counters.record_fire(elapsed_us, ok);
    }
}
