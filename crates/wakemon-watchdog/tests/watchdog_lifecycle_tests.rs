//! Tests for full start/stop lifecycle scenarios.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use wakemon_watchdog::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

fn fast_watchdog(threshold: Duration) -> Result<(Watchdog, Arc<RecordingAction>), WakemonError> {
    let config = WatchdogConfig::builder()
        .poll_interval_ms(2)
        .fire_threshold(threshold)
        .start_settle_ms(1)
        .thread_name("wakemon-test")
        .build()?;
    let action = Arc::new(RecordingAction::new());
    let watchdog = Watchdog::new(config, action.clone())?;
    Ok((watchdog, action))
}

#[test]
fn test_double_start_keeps_one_loop() -> TestResult {
    let (watchdog, _action) = fast_watchdog(Duration::from_secs(60))?;

    assert!(watchdog.start(1, 2));
    assert!(watchdog.start(3, 4));
    assert!(wait_until(Duration::from_secs(2), || watchdog.is_looping()));

    let stats = watchdog.stats();
    assert_eq!(stats.starts, 1);
    assert_eq!(stats.loop_entries, 1);

    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));
    Ok(())
}

#[test]
fn test_stop_start_stop_ends_stopped() -> TestResult {
    let (watchdog, _action) = fast_watchdog(Duration::from_secs(60))?;

    assert!(!watchdog.stop());
    assert!(watchdog.start(0, 0));
    watchdog.stop();

    // Within one poll interval (plus scheduling slack) the loop is gone.
    assert!(watchdog.wait_stopped(Duration::from_secs(1)));
    assert!(!watchdog.is_running());
    assert!(!watchdog.is_looping());
    Ok(())
}

#[test]
fn test_restart_after_full_stop() -> TestResult {
    let (watchdog, _action) = fast_watchdog(Duration::from_secs(60))?;

    assert!(watchdog.start(0, 0));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));

    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(2), || watchdog.stats().loop_entries == 2));
    assert_eq!(watchdog.stats().starts, 2);

    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));
    Ok(())
}

#[test]
fn test_start_while_stopping_is_a_no_op() -> TestResult {
    let config = WatchdogConfig::builder()
        .poll_interval_ms(200)
        .fire_threshold(Duration::from_secs(60))
        .start_settle_ms(0)
        .build()?;
    let watchdog = Watchdog::new(config, Arc::new(RecordingAction::new()))?;

    assert!(watchdog.start(0, 0));
    assert!(watchdog.stop());
    // The loop is still asleep, so the run-state is still set.
    assert!(watchdog.start(0, 0));
    assert_eq!(watchdog.stats().starts, 1);

    assert!(watchdog.wait_stopped(Duration::from_secs(2)));
    assert!(!watchdog.is_running());
    Ok(())
}

#[test]
fn test_fires_spaced_by_threshold() -> TestResult {
    let threshold = Duration::from_millis(40);
    let (watchdog, action) = fast_watchdog(threshold)?;

    let started = Instant::now();
    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(5), || action.fire_count() >= 3));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));

    // Fires are scheduled on the wall clock and stamped with `Instant`; allow
    // for the gap between sampling the clock and recording the fire.
    let min_gap = threshold - Duration::from_millis(5);
    let instants = action.fire_instants();
    assert!(instants.len() >= 3);
    assert!(instants[0].duration_since(started) >= min_gap);
    for pair in instants.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= min_gap);
    }
    Ok(())
}

#[test]
fn test_no_fire_after_stop() -> TestResult {
    let (watchdog, action) = fast_watchdog(Duration::from_millis(10))?;

    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(2), || action.fire_count() >= 1));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));

    let fired = action.fire_count();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(action.fire_count(), fired);
    assert_eq!(watchdog.stats().fires, fired);
    Ok(())
}

#[test]
fn test_reference_resets_on_each_start() -> TestResult {
    let clock = ManualClock::new(Timestamp::new(1_000, 0));
    let action = Arc::new(RecordingAction::new());
    let config = WatchdogConfig::builder()
        .poll_interval_ms(1)
        .fire_threshold_us(60_000_000)
        .start_settle_ms(0)
        .build()?;
    let watchdog = Watchdog::with_clock(config, action.clone(), clock.clone())?;

    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(2), || watchdog.stats().ticks > 0));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));

    // Long after the first run: a fresh start still waits a full threshold.
    clock.advance(Duration::from_secs(3_600));
    assert!(watchdog.start(0, 0));
    let ticks = watchdog.stats().ticks;
    assert!(wait_until(Duration::from_secs(2), || watchdog.stats().ticks > ticks + 2));
    assert_eq!(action.fire_count(), 0);

    clock.advance(Duration::from_secs(60));
    assert!(wait_until(Duration::from_secs(2), || action.fire_count() == 1));

    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));
    Ok(())
}

#[test]
fn test_closure_action() -> TestResult {
    let hits = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter = hits.clone();
    let action = move || -> WakemonResult<()> {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    };

    let config = WatchdogConfig::builder()
        .poll_interval_ms(2)
        .fire_threshold(Duration::from_millis(5))
        .build()?;
    let watchdog = Watchdog::new(config, Arc::new(action))?;
    assert_eq!(watchdog.action_name(), "closure");

    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(2), || {
        hits.load(std::sync::atomic::Ordering::SeqCst) >= 1
    }));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));
    Ok(())
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_spawn_failure_rolls_back_run_state() -> TestResult {
    // No platform can reserve a 64 TiB stack, so the spawn itself fails.
    let config = WatchdogConfig::builder()
        .poll_interval_ms(2)
        .stack_size(1 << 46)
        .build()?;
    let action = Arc::new(RecordingAction::new());
    let watchdog = Watchdog::new(config, action.clone())?;

    assert!(!watchdog.start(0, 0));
    assert!(!watchdog.is_running());
    assert!(!watchdog.is_looping());
    assert_eq!(watchdog.stats().starts, 0);
    assert_eq!(watchdog.stats().loop_entries, 0);
    assert_eq!(action.fire_count(), 0);
    Ok(())
}

#[test]
fn test_stop_during_sleep_never_fires() -> TestResult {
    let clock = ManualClock::new(Timestamp::new(10, 0));
    let config = WatchdogConfig::builder()
        .poll_interval_ms(500)
        .fire_threshold_us(1)
        .start_settle_ms(0)
        .build()?;
    let action = Arc::new(RecordingAction::new());
    let watchdog = Watchdog::with_clock(config, action.clone(), clock.clone())?;

    assert!(watchdog.start(0, 0));
    assert!(wait_until(Duration::from_secs(2), || watchdog.is_looping()));

    // Due as soon as the loop wakes, but the stop lands first.
    clock.advance(Duration::from_secs(60));
    watchdog.stop();
    assert!(watchdog.wait_stopped(Duration::from_secs(2)));

    assert_eq!(action.fire_count(), 0);
    assert_eq!(watchdog.stats().ticks, 0);
    Ok(())
}
