//! Prelude for wakemon-watchdog.
//!
//! Re-exports the types a host needs to build and drive a watchdog.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wakemon_watchdog::prelude::*;
//!
//! let watchdog = Watchdog::new(WatchdogConfig::default(), Arc::new(LogAction::default()))?;
//! assert!(!watchdog.stop());
//! # Ok::<(), WakemonError>(())
//! ```

pub use crate::action::{BroadcastAction, BroadcastConfig, LogAction, RecordingAction, WakeAction};
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::config::{WatchdogConfig, WatchdogConfigBuilder};
pub use crate::error::{WakemonError, WakemonResult};
pub use crate::stats::WatchdogStats;
pub use crate::timer::WakeTimer;
pub use crate::watchdog::Watchdog;
