//! # wakemon-watchdog
//!
//! Periodic wake-up watchdog for Android monitoring services.
//!
//! A single background thread polls the wall clock and, once a fixed
//! threshold has elapsed since the previous wake-up, fires a broadcast
//! (`am broadcast -a <action> --user 0`) so a monitoring receiver gets a
//! chance to run. The host owns a [`Watchdog`] and drives it with
//! [`Watchdog::start`] and [`Watchdog::stop`].
//!
//! ## Architecture
//!
//! - [`watchdog`] - start/stop control and the polling loop
//! - [`timer`] - fire schedule, independent of threads and clocks
//! - [`clock`] - `{seconds, microseconds}` wall-clock samples behind a trait
//! - [`action`] - wake-up actions: broadcast, dry-run logging, recording
//! - [`config`] - timing configuration with validation and a builder
//! - [`stats`] - counters exposed as a serializable snapshot
//! - [`error`] - error types
//!
//! ## Guarantees
//!
//! - At most one loop thread is active per watchdog.
//! - `start` and `stop` never propagate errors; they report the run-state.
//! - `stop` never blocks; the loop exits within one poll interval.
//! - Wake-up actions are fire-and-forget: failures are logged and counted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wakemon_watchdog::prelude::*;
//!
//! let action = Arc::new(BroadcastAction::new(BroadcastConfig::default())?);
//! let watchdog = Watchdog::new(WatchdogConfig::default(), action)?;
//!
//! watchdog.start(0, 0);
//! // ... host runs ...
//! watchdog.stop();
//! # Ok::<(), WakemonError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod action;
pub mod clock;
pub mod config;
pub mod error;
pub mod stats;
pub mod timer;
pub mod watchdog;

pub mod prelude;

/// `tracing` target of every event this crate emits.
pub const LOG_TARGET: &str = "wakemon";

pub use action::{BroadcastAction, BroadcastConfig, LogAction, RecordingAction, WakeAction};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{WatchdogConfig, WatchdogConfigBuilder};
pub use error::{WakemonError, WakemonResult};
pub use stats::WatchdogStats;
pub use timer::WakeTimer;
pub use watchdog::Watchdog;
