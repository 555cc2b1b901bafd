/*!
 * Coordinator Property Tests
 * Counter is exactly 2×N for any N under every deadlock-free configuration
 */

use dual_lock::{Coordinator, CoordinatorConfig, LockKind, SpinPolicy, SyncConfig};
use proptest::prelude::*;

fn lock_kind() -> impl Strategy<Value = LockKind> {
    prop_oneof![Just(LockKind::Spin), Just(LockKind::Parked)]
}

fn spin_policy() -> impl Strategy<Value = SpinPolicy> {
    prop_oneof![Just(SpinPolicy::Busy), Just(SpinPolicy::Backoff)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_counter_matches_budget(
        iterations in 1..500u64,
        mirrored in any::<bool>(),
        lock_kind in lock_kind(),
        spin_policy in spin_policy(),
    ) {
        let base = if mirrored {
            CoordinatorConfig::hold_and_retreat(iterations)
        } else {
            CoordinatorConfig::lock_ordering(iterations)
        };
        let config = base
            .with_sync(SyncConfig { lock_kind, spin_policy })
            .with_stall_timeout(std::time::Duration::from_secs(10));

        let report = Coordinator::new(config).unwrap().run().unwrap();

        prop_assert_eq!(report.counter, 2 * iterations);
        for stats in &report.workers {
            prop_assert_eq!(stats.successes, iterations);
        }
        prop_assert_eq!(report.total_successes(), report.counter);
        prop_assert_eq!(report.exclusion_violations, 0);
    }

    #[test]
    fn test_single_shot_never_over_counts(iterations in 1..2_000u64) {
        let report = Coordinator::new(CoordinatorConfig::single_shot(iterations))
            .unwrap()
            .run()
            .unwrap();

        prop_assert!(report.counter <= 2 * iterations);
        prop_assert_eq!(report.counter, report.total_successes());
        for stats in &report.workers {
            prop_assert_eq!(stats.iterations(), iterations);
        }
    }
}
