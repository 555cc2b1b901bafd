/*!
 * Deadlock Tests
 *
 * Mirrored lock orders without retreat. The rendezvous makes both workers
 * hold their first lock before either tries its second, so the deadlock is
 * certain rather than scheduler-dependent. One test leaves the collision to
 * the scheduler over a large N.
 */

use dual_lock::{Coordinator, CoordinatorConfig, CoordinatorError, WorkerId};
use serial_test::serial;
use std::time::{Duration, Instant};

#[test]
#[serial]
fn test_unguarded_deadlock_does_not_terminate() {
    let config = CoordinatorConfig::deadlock_prone(1_000).with_rendezvous();
    let handle = Coordinator::new(config).unwrap().spawn().unwrap();

    // Still spinning after a generous bound
    let handle = match handle.wait_timeout(Duration::from_millis(500)) {
        Ok(result) => panic!("deadlocked run terminated: {:?}", result),
        Err(handle) => handle,
    };

    // Reclaim the spinning threads
    assert!(!handle.is_cancelled());
    handle.cancel();
    assert!(handle.is_cancelled());
    let err = handle.join().unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Cancelled { completed: 0, .. }
    ));
}

#[test]
#[serial]
fn test_watchdog_reports_deadlock() {
    let config = CoordinatorConfig::deadlock_prone(1_000)
        .with_rendezvous()
        .with_stall_timeout(Duration::from_millis(200));

    let start = Instant::now();
    let err = Coordinator::new(config).unwrap().run().unwrap_err();

    match err {
        CoordinatorError::Deadlock {
            stalled_for_ms,
            progress,
        } => {
            assert!(stalled_for_ms >= 200);
            assert_eq!(progress, [0, 0]);
        }
        other => panic!("expected deadlock, got {:?}", other),
    }
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
#[serial]
fn test_spin_limit_reports_liveness_failure() {
    let config = CoordinatorConfig::deadlock_prone(1_000)
        .with_rendezvous()
        .with_spin_limit(100_000);

    let err = Coordinator::new(config).unwrap().run().unwrap_err();
    match err {
        CoordinatorError::LivenessFailure {
            worker,
            required,
            spins,
            ..
        } => {
            assert!(worker == WorkerId::A || worker == WorkerId::B);
            assert_eq!(required, 1_000);
            // The limit is tolerated; the miss after it gives up
            assert_eq!(spins, 100_001);
        }
        other => panic!("expected liveness failure, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_retreat_survives_forced_collision() {
    // Same rendezvous, but retreat breaks hold-and-wait
    let config = CoordinatorConfig::hold_and_retreat(1_000)
        .with_rendezvous()
        .with_stall_timeout(Duration::from_secs(5));

    let report = Coordinator::new(config).unwrap().run().unwrap();
    assert_eq!(report.counter, 2_000);
    assert!(report.is_consistent());
    // Both met holding their first lock, so whoever moved first had to retreat
    assert!(report.workers.iter().any(|w| w.retreats >= 1));
}

#[test]
#[serial]
fn test_forced_collision_deadlocks_on_every_run() {
    let config = CoordinatorConfig::deadlock_prone(1_000)
        .with_rendezvous()
        .with_stall_timeout(Duration::from_millis(200));
    let coordinator = Coordinator::new(config).unwrap();

    for run in 0..3 {
        match coordinator.run() {
            Err(CoordinatorError::Deadlock { progress, .. }) => assert_eq!(progress, [0, 0]),
            other => panic!("run {} should deadlock, got {:?}", run, other),
        }
    }
}

#[test]
#[serial]
fn test_mirrored_hold_and_wait_deadlocks_without_help() {
    const ITERATIONS: u64 = 1_000_000;
    let config = CoordinatorConfig::deadlock_prone(ITERATIONS)
        .with_stall_timeout(Duration::from_millis(300));
    let coordinator = Coordinator::new(config).unwrap();

    // Left to the scheduler, one of a few large runs is bound to interleave
    // badly; a run that slips through must at least be exact
    let mut deadlocked = false;
    for _ in 0..5 {
        match coordinator.run() {
            Err(CoordinatorError::Deadlock { progress, .. }) => {
                assert!(progress.iter().all(|&p| p < ITERATIONS));
                deadlocked = true;
                break;
            }
            Ok(report) => assert!(report.is_consistent()),
            Err(other) => panic!("unexpected failure: {:?}", other),
        }
    }
    assert!(deadlocked, "mirrored hold-and-wait never deadlocked");
}
