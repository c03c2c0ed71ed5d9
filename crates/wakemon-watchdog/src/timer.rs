//! Fire schedule of the watchdog loop.

/// Decides, per poll, whether the wake-up action is due.
///
/// Elapsed times are microseconds since the loop's reference timestamp. The
/// timer starts with its last fire at 0, so nothing fires before one full
/// threshold has passed since loop start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeTimer {
    threshold_us: u64,
    last_fire_us: u64,
}

impl WakeTimer {
    /// Create a timer that fires every `threshold_us` microseconds.
    #[must_use]
    pub fn new(threshold_us: u64) -> Self {
        Self {
            threshold_us,
            last_fire_us: 0,
        }
    }

    /// Check the schedule at `elapsed_us`.
    ///
    /// Returns `true` (and rearms from `elapsed_us`) once at least the
    /// threshold has passed since the last fire.
    pub fn poll(&mut self, elapsed_us: u64) -> bool {
        if elapsed_us.saturating_sub(self.last_fire_us) >= self.threshold_us {
            self.last_fire_us = elapsed_us;
            true
        } else {
            false
        }
    }

    /// Elapsed time of the last fire (0 before the first).
    #[must_use]
    pub fn last_fire_us(&self) -> u64 {
        self.last_fire_us
    }

    /// The configured threshold.
    #[must_use]
    pub fn threshold_us(&self) -> u64 {
        self.threshold_us
    }
}
