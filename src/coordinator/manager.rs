/*!
 * Coordinator
 *
 * Owns one run: builds the lock pair, spawns the two workers, optionally
 * watches for stalls, joins, and reads the counter.
 *
 * Without hardening (`spin_limit`, `stall_timeout`) a deadlock-prone
 * configuration hangs `run` forever, exactly like the unguarded experiment.
 * `spawn` keeps the caller free to bound that wait and cancel.
 */

use super::pair::LockPair;
use super::types::{AcquirePolicy, LockOrder, WorkerConfig, WorkerId};
use super::worker::{run_worker, WorkerEnv};
use crate::core::errors::{CoordinatorError, CoordinatorResult};
use crate::core::limits::{
    DEFAULT_SPIN_LIMIT, DEFAULT_STALL_TIMEOUT, ITERATIONS, WATCHDOG_POLL_INTERVAL, WORKER_COUNT,
};
use crate::core::sync::{CancelToken, Rendezvous, SyncConfig};
use crate::monitoring::{generate_run_id, Progress, WorkerStats};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Span};

/// Full description of one run
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Increments each worker must perform (N)
    pub iterations: u64,
    pub sync: SyncConfig,
    pub workers: [WorkerConfig; WORKER_COUNT],
    /// Consecutive misses a worker tolerates; the next one reports `LivenessFailure`
    pub spin_limit: Option<u64>,
    /// Watchdog window: no success for this long cancels the run
    pub stall_timeout: Option<Duration>,
    /// Each run makes the workers meet while holding their first locks
    pub force_collision: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::hold_and_retreat(ITERATIONS)
    }
}

impl CoordinatorConfig {
    fn with_workers(iterations: u64, workers: [WorkerConfig; WORKER_COUNT]) -> Self {
        Self {
            iterations,
            sync: SyncConfig::default(),
            workers,
            spin_limit: None,
            stall_timeout: None,
            force_collision: false,
        }
    }

    /// Both workers take L1 then L2 and never retreat
    ///
    /// Deadlock-free by ordering alone.
    pub fn lock_ordering(iterations: u64) -> Self {
        Self::with_workers(
            iterations,
            [
                WorkerConfig::new(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::HoldAndWait),
                WorkerConfig::new(WorkerId::B, LockOrder::FORWARD, AcquirePolicy::HoldAndWait),
            ],
        )
    }

    /// Mirrored orders, both workers retreat on a second-lock miss
    pub fn hold_and_retreat(iterations: u64) -> Self {
        Self::with_workers(
            iterations,
            [
                WorkerConfig::new(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::Retreat),
                WorkerConfig::new(WorkerId::B, LockOrder::REVERSED, AcquirePolicy::Retreat),
            ],
        )
    }

    /// Mirrored orders without retreat; can deadlock
    pub fn deadlock_prone(iterations: u64) -> Self {
        Self::with_workers(
            iterations,
            [
                WorkerConfig::new(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::HoldAndWait),
                WorkerConfig::new(WorkerId::B, LockOrder::REVERSED, AcquirePolicy::HoldAndWait),
            ],
        )
    }

    /// Mirrored orders, one try per iteration; terminates but loses increments
    pub fn single_shot(iterations: u64) -> Self {
        Self::with_workers(
            iterations,
            [
                WorkerConfig::new(WorkerId::A, LockOrder::FORWARD, AcquirePolicy::SingleShot),
                WorkerConfig::new(WorkerId::B, LockOrder::REVERSED, AcquirePolicy::SingleShot),
            ],
        )
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_spin_limit(mut self, limit: u64) -> Self {
        self.spin_limit = Some(limit);
        self
    }

    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = Some(timeout);
        self
    }

    /// Spin limit and watchdog at their default bounds
    pub fn bounded(self) -> Self {
        self.with_spin_limit(DEFAULT_SPIN_LIMIT)
            .with_stall_timeout(DEFAULT_STALL_TIMEOUT)
    }

    /// Make both workers meet while each holds its first lock
    ///
    /// With mirrored orders and `HoldAndWait` this turns a likely deadlock
    /// into a certain one, on every run. Requires the workers to start on
    /// different locks.
    pub fn with_rendezvous(mut self) -> Self {
        self.force_collision = true;
        self
    }

    pub fn validate(&self) -> CoordinatorResult<()> {
        for (slot, worker) in WorkerId::ALL.iter().zip(&self.workers) {
            if worker.id != *slot {
                return Err(CoordinatorError::InvalidConfig(format!(
                    "slot {} holds {}",
                    slot, worker.id
                )));
            }
            if !worker.order.is_valid() {
                return Err(CoordinatorError::InvalidConfig(format!(
                    "{} order {} names the same lock twice",
                    worker.id, worker.order
                )));
            }
        }
        let [a, b] = &self.workers;
        if self.force_collision && a.order.first == b.order.first {
            return Err(CoordinatorError::InvalidConfig(format!(
                "rendezvous with both workers starting on {} can never complete",
                a.order.first
            )));
        }
        if self.spin_limit == Some(0) {
            return Err(CoordinatorError::InvalidConfig(
                "spin limit must be non-zero".into(),
            ));
        }
        if self.stall_timeout == Some(Duration::ZERO) {
            return Err(CoordinatorError::InvalidConfig(
                "stall timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub iterations: u64,
    pub counter: u64,
    pub elapsed: Duration,
    pub workers: [WorkerStats; 2],
    pub exclusion_violations: u64,
    pub sync: SyncConfig,
}

impl RunReport {
    /// Counter value a correct run must reach (2×N)
    pub fn expected(&self) -> u64 {
        self.iterations * self.workers.len() as u64
    }

    pub fn total_successes(&self) -> u64 {
        self.workers.iter().map(|w| w.successes).sum()
    }

    pub fn worker(&self, id: WorkerId) -> &WorkerStats {
        &self.workers[id.index()]
    }

    /// Counter is exactly 2×N, every worker did N, nothing was double-counted
    pub fn is_consistent(&self) -> bool {
        self.counter == self.expected()
            && self.workers.iter().all(|w| w.successes == self.iterations)
            && self.total_successes() == self.counter
            && self.exclusion_violations == 0
    }
}

/// Runs the dual-lock experiment
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> CoordinatorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run to completion on the calling thread
    pub fn run(&self) -> CoordinatorResult<RunReport> {
        self.run_with(CancelToken::new())
    }

    /// Run on a supervisor thread and return immediately
    pub fn spawn(self) -> CoordinatorResult<RunHandle> {
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();

        let supervisor_cancel = cancel.clone();
        thread::Builder::new()
            .name("coordinator".into())
            .spawn(move || {
                // Receiver may already be gone; nothing left to report to
                let _ = tx.send(self.run_with(supervisor_cancel));
            })
            .map_err(|e| CoordinatorError::Spawn(e.to_string()))?;

        Ok(RunHandle { cancel, rx })
    }

    fn run_with(&self, cancel: CancelToken) -> CoordinatorResult<RunReport> {
        let run_id = generate_run_id();
        let span = info_span!(
            "run",
            run_id = %run_id,
            iterations = self.config.iterations,
            lock_kind = ?self.config.sync.lock_kind,
        );
        let _entered = span.enter();

        info!(
            a = %self.config.workers[0].order,
            b = %self.config.workers[1].order,
            a_policy = ?self.config.workers[0].policy,
            b_policy = ?self.config.workers[1].policy,
            "run starting"
        );

        let pair = Arc::new(LockPair::new(self.config.sync.lock_kind));
        let env = self.worker_env(cancel);

        let start = Instant::now();
        let handles = self.spawn_workers(&pair, &env)?;

        let stall = match self.config.stall_timeout {
            Some(timeout) => watch(&handles, &env, timeout),
            None => None,
        };

        let mut stats = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();
        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok(s)) => stats.push(s),
                Ok(Err(e)) => failures.push(e),
                Err(_) => failures.push(CoordinatorError::WorkerPanicked(id)),
            }
        }
        let elapsed = start.elapsed();

        if let Some(deadlock) = stall {
            warn!(error = %deadlock, "run cancelled by watchdog");
            return Err(deadlock);
        }
        // Report the cause rather than a cancellation it triggered
        failures.sort_by_key(|e| matches!(e, CoordinatorError::Cancelled { .. }));
        if let Some(first) = failures.into_iter().next() {
            return Err(first);
        }

        let workers: [WorkerStats; 2] = match stats.try_into() {
            Ok(workers) => workers,
            Err(_) => return Err(CoordinatorError::SupervisorLost),
        };

        let report = RunReport {
            run_id,
            iterations: self.config.iterations,
            counter: pair.snapshot(),
            elapsed,
            workers,
            exclusion_violations: pair.exclusion_violations(),
            sync: self.config.sync,
        };

        info!(
            counter = report.counter,
            expected = report.expected(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            consistent = report.is_consistent(),
            "run finished"
        );
        if let Ok(json) = serde_json::to_string(&report) {
            debug!(report = %json, "run report");
        }

        Ok(report)
    }

    /// Fresh per-run state; a barrier passed by an earlier run never carries over
    fn worker_env(&self, cancel: CancelToken) -> WorkerEnv {
        WorkerEnv {
            cancel,
            progress: Arc::new(Progress::new()),
            spin_policy: self.config.sync.spin_policy,
            spin_limit: self.config.spin_limit,
            rendezvous: self
                .config
                .force_collision
                .then(|| Rendezvous::new(WORKER_COUNT)),
        }
    }

    fn spawn_workers(
        &self,
        pair: &Arc<LockPair>,
        env: &WorkerEnv,
    ) -> CoordinatorResult<Vec<(WorkerId, JoinHandle<CoordinatorResult<WorkerStats>>)>> {
        let mut handles = Vec::with_capacity(WORKER_COUNT);

        for &worker in &self.config.workers {
            let pair = Arc::clone(pair);
            let worker_env = env.clone();
            let iterations = self.config.iterations;
            let id = worker.id;
            let span = Span::current();

            let spawned = thread::Builder::new().name(id.to_string()).spawn(move || {
                let _entered = span.enter();
                run_worker(&pair, &worker, iterations, &worker_env)
            });

            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    // Don't leave the first worker spinning alone
                    cancel_and_join(env, handles);
                    return Err(CoordinatorError::Spawn(e.to_string()));
                }
            }
        }

        Ok(handles)
    }
}

fn cancel_and_join(
    env: &WorkerEnv,
    handles: Vec<(WorkerId, JoinHandle<CoordinatorResult<WorkerStats>>)>,
) {
    env.cancel.cancel();
    for (_, handle) in handles {
        let _ = handle.join();
    }
}

/// Poll worker progress until both finish or nobody succeeds for `timeout`
///
/// On a stall the run is cancelled and the deadlock error returned; the
/// caller still joins the workers.
fn watch(
    handles: &[(WorkerId, JoinHandle<CoordinatorResult<WorkerStats>>)],
    env: &WorkerEnv,
    timeout: Duration,
) -> Option<CoordinatorError> {
    let mut last_total = env.progress.total();
    let mut last_change = Instant::now();

    while !handles.iter().all(|(_, h)| h.is_finished()) {
        thread::sleep(WATCHDOG_POLL_INTERVAL);

        let total = env.progress.total();
        if total != last_total {
            last_total = total;
            last_change = Instant::now();
            continue;
        }

        let stalled_for = last_change.elapsed();
        if stalled_for >= timeout {
            env.cancel.cancel();
            return Some(CoordinatorError::Deadlock {
                stalled_for_ms: stalled_for.as_millis() as u64,
                progress: env.progress.snapshot(),
            });
        }
    }
    None
}

/// A run in flight on its supervisor thread
///
/// Dropping the handle cancels the run.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancelToken,
    rx: mpsc::Receiver<CoordinatorResult<RunReport>>,
}

impl RunHandle {
    /// Ask both workers to stop at their next spin
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait up to `timeout` for the outcome
    ///
    /// Hands the handle back if the run is still going.
    pub fn wait_timeout(self, timeout: Duration) -> Result<CoordinatorResult<RunReport>, Self> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(CoordinatorError::SupervisorLost)),
        }
    }

    /// Block until the run ends
    pub fn join(self) -> CoordinatorResult<RunReport> {
        self.rx
            .recv()
            .unwrap_or(Err(CoordinatorError::SupervisorLost))
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
