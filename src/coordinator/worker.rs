/*!
 * Worker Protocol
 *
 * One worker's loop: take the first lock, try the second, increment while
 * holding both, release, repeat. A miss is control flow, handled per
 * `AcquirePolicy`:
 *
 * - `Retreat`: drop the first lock and start over
 * - `HoldAndWait`: keep the first lock and spin on the second
 * - `SingleShot`: one try per iteration, a miss consumes the iteration
 *
 * Every spin goes through `SpinWait::miss`, which is where cancellation and
 * the optional spin limit are enforced. Returning early drops any held guard,
 * so a worker that gives up never leaves a lock behind.
 */

use super::pair::{BothHeld, LockPair, PairHeld};
use super::types::{AcquirePolicy, WorkerConfig};
use crate::core::errors::{CoordinatorError, CoordinatorResult};
use crate::core::sync::{CancelToken, Rendezvous, SpinExhausted, SpinPolicy, SpinWait};
use crate::monitoring::{Progress, WorkerStats};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared run state handed to every worker
#[derive(Debug, Clone, Default)]
pub struct WorkerEnv {
    pub cancel: CancelToken,
    pub progress: Arc<Progress>,
    pub spin_policy: SpinPolicy,
    /// Consecutive misses tolerated; the next one reports `LivenessFailure`
    pub spin_limit: Option<u64>,
    /// Passed once per worker, right after its first lock is taken for the
    /// first time. Build a fresh one for every run: a passed barrier stays open.
    pub rendezvous: Option<Rendezvous>,
}

/// Per-call mutable state, kept together so the helpers stay small
struct Attempt<'c> {
    config: &'c WorkerConfig,
    env: &'c WorkerEnv,
    iterations: u64,
    spin: SpinWait,
    stats: WorkerStats,
    rendezvous: Option<Rendezvous>,
}

/// Run one worker until it has performed `iterations` protected increments
///
/// With `SingleShot` the worker instead runs exactly `iterations` attempts
/// and reports the misses as `skipped`.
pub fn run_worker(
    pair: &LockPair,
    config: &WorkerConfig,
    iterations: u64,
    env: &WorkerEnv,
) -> CoordinatorResult<WorkerStats> {
    debug!(
        worker = %config.id,
        order = %config.order,
        policy = ?config.policy,
        iterations,
        "worker started"
    );

    let mut attempt = Attempt {
        config,
        env,
        iterations,
        spin: SpinWait::new(env.spin_policy, env.spin_limit),
        stats: WorkerStats::new(config.id),
        rendezvous: env.rendezvous.clone(),
    };

    let result = match config.policy {
        AcquirePolicy::SingleShot => attempt.run_single_shot(pair),
        AcquirePolicy::Retreat | AcquirePolicy::HoldAndWait => attempt.run_until_done(pair),
    };

    attempt.stats.max_streak = attempt.spin.max_streak();
    match result {
        Ok(()) => {
            debug!(
                worker = %config.id,
                successes = attempt.stats.successes,
                attempts = attempt.stats.attempts,
                retreats = attempt.stats.retreats,
                skipped = attempt.stats.skipped,
                "worker finished"
            );
            Ok(attempt.stats)
        }
        Err(e) => {
            warn!(worker = %config.id, error = %e, "worker stopped early");
            Err(e)
        }
    }
}

impl<'c> Attempt<'c> {
    fn run_until_done(&mut self, pair: &LockPair) -> CoordinatorResult<()> {
        while self.stats.successes < self.iterations {
            self.check_cancelled()?;
            let mut both = self.acquire_both(pair)?;
            both.increment();
            drop(both);
            self.succeed();
        }
        Ok(())
    }

    fn run_single_shot(&mut self, pair: &LockPair) -> CoordinatorResult<()> {
        let order = self.config.order;
        for _ in 0..self.iterations {
            self.check_cancelled()?;
            self.stats.attempts += 1;

            let Some(first) = pair.try_hold(order.first) else {
                self.stats.first_misses += 1;
                self.stats.skipped += 1;
                continue;
            };
            self.meet()?;

            match pair.try_hold(order.second) {
                Some(second) => {
                    let mut both = self.join(first, second)?;
                    both.increment();
                    drop(both);
                    self.succeed();
                }
                None => {
                    drop(first);
                    self.stats.second_misses += 1;
                    self.stats.retreats += 1;
                    self.stats.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Spin until both locks are held, per the configured policy
    fn acquire_both<'p>(&mut self, pair: &'p LockPair) -> CoordinatorResult<BothHeld<'p>> {
        let order = self.config.order;
        loop {
            self.stats.attempts += 1;

            let Some(first) = pair.try_hold(order.first) else {
                self.stats.first_misses += 1;
                self.pause()?;
                continue;
            };
            self.meet()?;

            match self.config.policy {
                AcquirePolicy::HoldAndWait => loop {
                    if let Some(second) = pair.try_hold(order.second) {
                        return self.join(first, second);
                    }
                    self.stats.second_misses += 1;
                    self.pause()?;
                },
                _ => {
                    if let Some(second) = pair.try_hold(order.second) {
                        return self.join(first, second);
                    }
                    drop(first);
                    self.stats.second_misses += 1;
                    self.stats.retreats += 1;
                    self.pause()?;
                }
            }
        }
    }

    fn join<'p>(
        &self,
        first: PairHeld<'p>,
        second: PairHeld<'p>,
    ) -> CoordinatorResult<BothHeld<'p>> {
        BothHeld::new(first, second).ok_or_else(|| {
            CoordinatorError::InvalidConfig(format!(
                "{} order {} does not name two distinct locks",
                self.config.id, self.config.order
            ))
        })
    }

    /// Pass the one-shot rendezvous, if any, while holding the first lock
    fn meet(&mut self) -> CoordinatorResult<()> {
        if let Some(rendezvous) = self.rendezvous.take() {
            if !rendezvous.arrive(&self.env.cancel) {
                return Err(self.cancelled());
            }
        }
        Ok(())
    }

    /// Account for a miss and spin once
    #[inline]
    fn pause(&mut self) -> CoordinatorResult<()> {
        self.check_cancelled()?;
        self.spin
            .miss()
            .map_err(|SpinExhausted(spins)| CoordinatorError::LivenessFailure {
                worker: self.config.id,
                completed: self.stats.successes,
                required: self.iterations,
                spins,
            })
    }

    #[inline]
    fn succeed(&mut self) {
        self.stats.successes += 1;
        self.env.progress.record(self.config.id);
        self.spin.reset();
    }

    #[inline]
    fn check_cancelled(&self) -> CoordinatorResult<()> {
        if self.env.cancel.is_cancelled() {
            Err(self.cancelled())
        } else {
            Ok(())
        }
    }

    fn cancelled(&self) -> CoordinatorError {
        CoordinatorError::Cancelled {
            worker: self.config.id,
            completed: self.stats.successes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::types::{LockId, LockOrder, WorkerId};
    use crate::core::sync::LockKind;

    fn worker(id: WorkerId, order: LockOrder, policy: AcquirePolicy) -> WorkerConfig {
        WorkerConfig::new(id, order, policy)
    }

    #[test]
    fn test_uncontended_worker_completes() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv::default();
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::Retreat);

        let stats = run_worker(&pair, &config, 100, &env).unwrap();
        assert_eq!(stats.successes, 100);
        assert_eq!(stats.attempts, 100);
        assert_eq!(stats.retreats, 0);
        assert_eq!(pair.snapshot(), 100);
        assert_eq!(env.progress.get(WorkerId::A), 100);
    }

    #[test]
    fn test_zero_iterations() {
        let pair = LockPair::new(LockKind::Parked);
        let env = WorkerEnv::default();
        let config = worker(WorkerId::B, LockOrder::REVERSED, AcquirePolicy::HoldAndWait);

        let stats = run_worker(&pair, &config, 0, &env).unwrap();
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.attempts, 0);
        assert_eq!(pair.snapshot(), 0);
    }

    #[test]
    fn test_retreat_releases_first_lock() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv {
            spin_limit: Some(10),
            ..Default::default()
        };
        // Peer holds L2 forever
        let _blocker = pair.try_hold(LockId::L2).unwrap();
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::Retreat);

        let err = run_worker(&pair, &config, 5, &env).unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::LivenessFailure {
                worker: WorkerId::A,
                completed: 0,
                required: 5,
                spins: 11,
            }
        ));
        // L1 was never left held
        assert!(!pair.is_locked(LockId::L1));
    }

    #[test]
    fn test_spin_limit_of_one_tolerates_one_miss() {
        let pair = LockPair::new(LockKind::Parked);
        let env = WorkerEnv {
            spin_limit: Some(1),
            ..Default::default()
        };
        let _blocker = pair.try_hold(LockId::L2).unwrap();
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::Retreat);

        let err = run_worker(&pair, &config, 1, &env).unwrap_err();
        assert_eq!(
            err,
            CoordinatorError::LivenessFailure {
                worker: WorkerId::A,
                completed: 0,
                required: 1,
                spins: 2,
            }
        );
        assert!(!pair.is_locked(LockId::L1));
    }

    #[test]
    fn test_rendezvous_from_env_is_passed_once() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv {
            rendezvous: Some(Rendezvous::new(1)),
            ..Default::default()
        };
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::HoldAndWait);

        let stats = run_worker(&pair, &config, 3, &env).unwrap();
        assert_eq!(stats.successes, 3);
        assert_eq!(env.rendezvous.as_ref().unwrap().arrived(), 1);
    }

    #[test]
    fn test_hold_and_wait_keeps_first_lock_until_giving_up() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv {
            spin_limit: Some(1_000),
            ..Default::default()
        };
        let _blocker = pair.try_hold(LockId::L1).unwrap();
        let config = worker(WorkerId::B, LockOrder::REVERSED, AcquirePolicy::HoldAndWait);

        let err = run_worker(&pair, &config, 1, &env).unwrap_err();
        assert!(err.is_liveness());
        // Guard dropped on the error path
        assert!(!pair.is_locked(LockId::L2));
    }

    #[test]
    fn test_single_shot_counts_skips() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv::default();
        let _blocker = pair.try_hold(LockId::L2).unwrap();
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::SingleShot);

        let stats = run_worker(&pair, &config, 50, &env).unwrap();
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.skipped, 50);
        assert_eq!(stats.second_misses, 50);
        assert_eq!(stats.iterations(), 50);
    }

    #[test]
    fn test_cancel_stops_spinning_worker() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv::default();
        env.cancel.cancel();
        let _blocker = pair.try_hold(LockId::L1).unwrap();
        let config = worker(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::Retreat);

        let err = run_worker(&pair, &config, 1, &env).unwrap_err();
        assert_eq!(
            err,
            CoordinatorError::Cancelled {
                worker: WorkerId::A,
                completed: 0
            }
        );
    }

    #[test]
    fn test_same_lock_twice_never_progresses() {
        let pair = LockPair::new(LockKind::Spin);
        let env = WorkerEnv {
            spin_limit: Some(100),
            ..Default::default()
        };
        let config = worker(
            WorkerId::A,
            LockOrder::new(LockId::L1, LockId::L1),
            AcquirePolicy::Retreat,
        );

        // Non-reentrant: the second try on L1 always misses
        let err = run_worker(&pair, &config, 1, &env).unwrap_err();
        assert!(err.is_liveness());
    }
}
