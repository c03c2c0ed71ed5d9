//! Wall-clock sampling for the watchdog loop.
//!
//! The loop measures elapsed time as the difference between two
//! `{seconds, microseconds}` samples, like `gettimeofday`. The source is
//! behind the [`Clock`] trait so tests can drive time by hand.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MICROS_PER_SEC: u64 = 1_000_000;

/// A wall-clock sample split into whole seconds and sub-second microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds.
    pub secs: u64,
    /// Microseconds within the second (`0..1_000_000`).
    pub micros: u32,
}

impl Timestamp {
    /// Create a timestamp, carrying excess microseconds into seconds.
    #[must_use]
    pub fn new(secs: u64, micros: u32) -> Self {
        let carry = u64::from(micros) / MICROS_PER_SEC;
        let micros = u64::from(micros) % MICROS_PER_SEC;
        Self {
            secs: secs.saturating_add(carry),
            // micros < 1_000_000 fits in u32
            micros: u32::try_from(micros).unwrap_or(0),
        }
    }

    /// Build a timestamp from a total microsecond count.
    #[must_use]
    pub fn from_micros(total_us: u64) -> Self {
        Self::new(
            total_us / MICROS_PER_SEC,
            u32::try_from(total_us % MICROS_PER_SEC).unwrap_or(0),
        )
    }

    /// Total microseconds represented by this timestamp, saturating.
    #[must_use]
    pub fn as_micros(&self) -> u64 {
        self.secs
            .saturating_mul(MICROS_PER_SEC)
            .saturating_add(u64::from(self.micros))
    }

    /// Microseconds elapsed from `reference` to `self`.
    ///
    /// Returns 0 when `self` is earlier than `reference` (wall clock stepped back).
    #[must_use]
    pub fn elapsed_micros_since(&self, reference: Timestamp) -> u64 {
        self.as_micros().saturating_sub(reference.as_micros())
    }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self::new(d.as_secs(), d.subsec_micros())
    }
}

/// Source of wall-clock samples.
pub trait Clock: Send + Sync {
    /// Sample the clock.
    fn now(&self) -> Timestamp;
}

/// Clock backed by `SystemTime`, measured from the UNIX epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or_else(|_| Timestamp::default(), Timestamp::from)
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give the other to a watchdog.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now_us: Arc::new(AtomicU64::new(start.as_micros())),
        }
    }

    /// Set the current reading.
    pub fn set(&self, now: Timestamp) {
        self.now_us.store(now.as_micros(), Ordering::Release);
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let delta = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        let mut now = self.now_us.load(Ordering::Acquire);
        loop {
            match self.now_us.compare_exchange_weak(
                now,
                now.saturating_add(delta),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => now = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.now_us.load(Ordering::Acquire))
    }
}
