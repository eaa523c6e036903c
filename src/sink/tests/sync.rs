use crate::error::SinkError;
use crate::sink::sync::{
    Correction, QUICK_WINDOW, SYNC_WINDOW, SyncEstimator, SyncWindow, TimingSnapshot,
};

const RATE: u32 = 44_100;
const NOW: u32 = 10_000;

fn estimator() -> SyncEstimator {
    let mut sync = SyncEstimator::new(RATE, 10);
    sync.reset(true);
    sync.set_start_time(NOW);
    sync
}

/// Snapshot whose quick-mode error is `error_ms`
fn quick_snapshot(error_ms: i64) -> TimingSnapshot {
    // nothing played, target start is now: the error is the heartbeat age
    TimingSnapshot {
        now: NOW,
        updated: NOW.wrapping_add_signed(-i32::try_from(error_ms).unwrap()),
        rendering: true,
        ..TimingSnapshot::default()
    }
}

/// Snapshot whose steady-mode error is `error_ms`
fn steady_snapshot(error_ms: i64) -> TimingSnapshot {
    TimingSnapshot {
        now: NOW,
        updated: NOW,
        rendering: true,
        playtime: NOW.wrapping_add_signed(i32::try_from(error_ms).unwrap()),
        ..TimingSnapshot::default()
    }
}

fn steady_estimator() -> SyncEstimator {
    let mut sync = estimator();
    for _ in 0..QUICK_WINDOW {
        sync.measure(&quick_snapshot(0)).unwrap();
    }
    assert!(!sync.window().is_quick());
    sync
}

#[test]
fn test_window_starts_quick() {
    let window = SyncWindow::new();
    assert!(window.is_quick());
    assert_eq!(window.size(), QUICK_WINDOW);
    assert_eq!(window.index(), 0);
    assert_eq!(window.errors(), &[0; SYNC_WINDOW]);
}

#[test]
fn test_window_push_wraps_at_size() {
    let mut window = SyncWindow::new();
    assert!((window.push(4) - 2.0).abs() < f64::EPSILON);
    assert_eq!(window.index(), 1);
    assert!((window.push(8) - 6.0).abs() < f64::EPSILON);
    assert_eq!(window.index(), 0);

    // quick mode only averages the first two slots
    assert!((window.push(2) - 5.0).abs() < f64::EPSILON);
    assert_eq!(window.errors(), &[2, 8, 0, 0, 0]);
}

#[test]
fn test_window_reset() {
    let mut window = SyncWindow::new();
    window.push(100);
    window.reset();
    assert_eq!(window, SyncWindow::new());
}

#[test]
fn test_quick_mode_exits_after_wrap_in_band() {
    let mut sync = estimator();

    let first = sync.measure(&quick_snapshot(4)).unwrap();
    assert_eq!(first.correction, None);
    // index is 1, not yet wrapped
    assert!(sync.window().is_quick());

    let second = sync.measure(&quick_snapshot(6)).unwrap();
    assert_eq!(second.correction, None);
    assert!(!sync.window().is_quick());
    assert_eq!(sync.window().size(), SYNC_WINDOW);
    assert_eq!(sync.window().index(), 0);
}

#[test]
fn test_quick_mode_stays_when_out_of_band() {
    let mut sync = estimator();

    sync.measure(&quick_snapshot(5)).unwrap();
    let m = sync.measure(&quick_snapshot(20)).unwrap();

    assert!((m.mean_ms - 12.5).abs() < 1e-9);
    assert_eq!(m.correction, Some(Correction::Pause(551)));
    assert!(sync.window().is_quick());
    assert_eq!(sync.window().errors(), &[0; SYNC_WINDOW]);
}

#[test]
fn test_quick_mode_late_start_skips() {
    let mut sync = estimator();
    // half a second since the target start, nothing played yet
    let snap = TimingSnapshot {
        now: NOW + 500,
        updated: NOW + 500,
        rendering: true,
        ..TimingSnapshot::default()
    };

    let m = sync.measure(&snap).unwrap();
    assert_eq!(m.error_ms, -500);
    assert!((m.mean_ms + 250.0).abs() < 1e-9);
    assert_eq!(m.correction, Some(Correction::Skip(11_025)));
}

#[test]
fn test_quick_mode_subtracts_device_frames() {
    let mut sync = estimator();
    let snap = TimingSnapshot {
        now: NOW + 100,
        updated: NOW + 60,
        rendering: true,
        device_frames: 441,
        frames_played_dmp: 441 + 1764,
        ..TimingSnapshot::default()
    };

    // 40ms since heartbeat + 40ms played beyond the device queue - 100ms
    let m = sync.measure(&snap).unwrap();
    assert_eq!(m.error_ms, -20);
}

#[test]
fn test_steady_mean_in_band() {
    let mut sync = steady_estimator();

    let mut last = None;
    for error in [12, 8, -3, 15, 9] {
        last = Some(sync.measure(&steady_snapshot(error)).unwrap());
    }

    let m = last.unwrap();
    assert!((m.mean_ms - 8.2).abs() < 1e-9);
    assert_eq!(m.correction, None);
    assert_eq!(sync.window().errors(), &[12, 8, -3, 15, 9]);
}

#[test]
fn test_steady_large_lag_skips_and_clears() {
    let mut sync = steady_estimator();

    let m = sync.measure(&steady_snapshot(-200)).unwrap();
    assert!((m.mean_ms + 40.0).abs() < 1e-9);
    assert_eq!(m.correction, Some(Correction::Skip(1764)));
    assert_eq!(sync.window().errors(), &[0; SYNC_WINDOW]);
    // position and mode survive the correction
    assert_eq!(sync.window().index(), 1);
    assert!(!sync.window().is_quick());
}

#[test]
fn test_steady_ahead_pauses() {
    let mut sync = steady_estimator();

    let m = sync.measure(&steady_snapshot(100)).unwrap();
    assert!((m.mean_ms - 20.0).abs() < 1e-9);
    assert_eq!(m.correction, Some(Correction::Pause(882)));
}

#[test]
fn test_steady_accounts_for_queued_frames() {
    let mut sync = steady_estimator();
    // one second buffered, heartbeat 100ms old: block plays locally in 900ms
    let snap = TimingSnapshot {
        now: NOW,
        updated: NOW - 100,
        rendering: true,
        frames_ahead: 44_100,
        playtime: NOW + 900,
        ..TimingSnapshot::default()
    };

    let m = sync.measure(&snap).unwrap();
    assert_eq!(m.error_ms, 0);
    assert_eq!(m.correction, None);
}

#[test]
fn test_steady_across_clock_wrap() {
    let mut sync = SyncEstimator::new(RATE, 10);
    sync.reset(true);
    sync.set_start_time(u32::MAX - 10);
    let quick = TimingSnapshot {
        now: u32::MAX - 10,
        updated: u32::MAX - 10,
        rendering: true,
        ..TimingSnapshot::default()
    };
    sync.measure(&quick).unwrap();
    sync.measure(&quick).unwrap();
    assert!(!sync.window().is_quick());

    let snap = TimingSnapshot {
        now: u32::MAX - 10,
        updated: u32::MAX - 10,
        rendering: true,
        playtime: 20,
        ..TimingSnapshot::default()
    };
    assert_eq!(sync.measure(&snap).unwrap().error_ms, 31);
}

#[test]
fn test_insufficient_data_leaves_window() {
    let mut sync = steady_estimator();
    sync.measure(&steady_snapshot(7)).unwrap();
    let before = sync.window().clone();

    let snap = TimingSnapshot {
        rendering: true,
        device_frames: 1000,
        frames_played_dmp: 999,
        ..TimingSnapshot::default()
    };
    let err = sync.measure(&snap).unwrap_err();

    assert!(matches!(
        err,
        SinkError::InsufficientData {
            played: 999,
            required: 1000
        }
    ));
    assert_eq!(sync.window(), &before);
}

#[test]
fn test_disabled_or_idle_skips_measurement() {
    let mut sync = SyncEstimator::new(RATE, 10);
    assert!(!sync.is_enabled());
    let err = sync.measure(&quick_snapshot(0)).unwrap_err();
    assert!(err.is_measurement_skipped());

    sync.reset(true);
    let idle = TimingSnapshot {
        rendering: false,
        ..quick_snapshot(0)
    };
    let err = sync.measure(&idle).unwrap_err();
    assert!(matches!(err, SinkError::SyncUnavailable { .. }));
    assert_eq!(sync.window(), &SyncWindow::new());
}

#[test]
fn test_reset_rearms_quick_mode() {
    let mut sync = steady_estimator();
    sync.measure(&steady_snapshot(3)).unwrap();

    sync.reset(false);
    assert!(!sync.is_enabled());
    assert!(sync.window().is_quick());
    assert_eq!(sync.window().index(), 0);
}
