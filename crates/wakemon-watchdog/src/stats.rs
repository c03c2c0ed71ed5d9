//! Watchdog counters.
//!
//! Counters are plain atomics updated by the loop thread and by `start`;
//! readers take a [`WatchdogStats`] snapshot.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the watchdog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchdogStats {
    /// Calls to `start` that launched a loop.
    pub starts: u64,
    /// Loop threads that got past the single-loop guard.
    pub loop_entries: u64,
    /// Completed poll iterations across all runs.
    pub ticks: u64,
    /// Wake-up actions performed (including failed ones).
    pub fires: u64,
    /// Wake-up actions that reported an error.
    pub failed_fires: u64,
    /// Elapsed microseconds (since loop start) of the most recent fire.
    pub last_fire_elapsed_us: u64,
    /// Run-state at snapshot time.
    pub running: bool,
    /// Whether a loop was active at snapshot time.
    pub looping: bool,
}

impl WatchdogStats {
    /// Fraction of fires that failed, as a percentage.
    ///
    /// Returns 0.0 if nothing has fired yet.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        if self.fires == 0 {
            0.0
        } else {
            (self.failed_fires as f64 / self.fires as f64) * 100.0
        }
    }
}

/// Shared counters behind [`WatchdogStats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    starts: AtomicU64,
    loop_entries: AtomicU64,
    ticks: AtomicU64,
    fires: AtomicU64,
    failed_fires: AtomicU64,
    last_fire_elapsed_us: AtomicU64,
}

impl Counters {
    pub(crate) fn record_start(&self) {
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_loop_entry(&self) {
        self.loop_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fire(&self, elapsed_us: u64, ok: bool) {
        self.last_fire_elapsed_us.store(elapsed_us, Ordering::Relaxed);
        if !ok {
            self.failed_fires.fetch_add(1, Ordering::Relaxed);
        }
        self.fires.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn snapshot(&self, running: bool, looping: bool) -> WatchdogStats {
        WatchdogStats {
            starts: self.starts.load(Ordering::Relaxed),
            loop_entries: self.loop_entries.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            fires: self.fires.load(Ordering::Acquire),
            failed_fires: self.failed_fires.load(Ordering::Relaxed),
            last_fire_elapsed_us: self.last_fire_elapsed_us.load(Ordering::Relaxed),
            running,
            looping,
        }
    }
}
