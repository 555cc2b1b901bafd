/*!
 * Lock-Free Baselines
 *
 * The same two-worker increment loop without the lock pair, for comparison:
 *
 * - `Unprotected`: load then store, so concurrent increments get lost
 * - `Atomic`: one `fetch_add` per increment, always exact
 *
 * Neither variant needs deadlock avoidance; they bracket what the dual-lock
 * protocol costs.
 */

use super::types::WorkerId;
use crate::core::errors::{CoordinatorError, CoordinatorResult};
use crate::core::limits::WORKER_COUNT;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Span};

/// How the baseline counter is updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    Unprotected,
    Atomic,
}

/// Outcome of one baseline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineReport {
    pub baseline: Baseline,
    pub iterations: u64,
    pub counter: u64,
    pub elapsed: Duration,
}

impl BaselineReport {
    pub fn expected(&self) -> u64 {
        self.iterations * WORKER_COUNT as u64
    }

    /// Increments overwritten by a racing store
    pub fn lost(&self) -> u64 {
        self.expected().saturating_sub(self.counter)
    }
}

/// Run both workers for `iterations` increments each against one counter
pub fn run_baseline(baseline: Baseline, iterations: u64) -> CoordinatorResult<BaselineReport> {
    let span = info_span!("baseline", ?baseline, iterations);
    let _entered = span.enter();

    let counter = AtomicU64::new(0);
    let start = Instant::now();

    thread::scope(|scope| -> CoordinatorResult<()> {
        let mut handles = Vec::with_capacity(WORKER_COUNT);
        for id in WorkerId::ALL {
            let counter = &counter;
            let span = Span::current();
            let handle = thread::Builder::new()
                .name(format!("{}-baseline", id))
                .spawn_scoped(scope, move || {
                    let _entered = span.enter();
                    increment(baseline, counter, iterations);
                })
                .map_err(|e| CoordinatorError::Spawn(e.to_string()))?;
            handles.push((id, handle));
        }
        for (id, handle) in handles {
            handle
                .join()
                .map_err(|_| CoordinatorError::WorkerPanicked(id))?;
        }
        Ok(())
    })?;

    let report = BaselineReport {
        baseline,
        iterations,
        counter: counter.into_inner(),
        elapsed: start.elapsed(),
    };
    debug!(
        counter = report.counter,
        lost = report.lost(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "baseline finished"
    );
    Ok(report)
}

#[inline]
fn increment(baseline: Baseline, counter: &AtomicU64, iterations: u64) {
    match baseline {
        Baseline::Unprotected => {
            for _ in 0..iterations {
                // Read-modify-write split in two; the peer can slip in between
                let value = counter.load(Ordering::Relaxed);
                counter.store(value + 1, Ordering::Relaxed);
            }
        }
        Baseline::Atomic => {
            for _ in 0..iterations {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
