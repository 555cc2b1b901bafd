/*!
 * Run Metrics
 *
 * - `WorkerStats`: owned by a worker thread, handed back at join
 * - `Progress`: shared success counters the watchdog samples mid-run
 */

use crate::coordinator::WorkerId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: WorkerId,
    /// Passes through the acquire sequence (every first-lock attempt)
    pub attempts: u64,
    /// Attempts that missed the first lock
    pub first_misses: u64,
    /// Attempts that took the first lock and missed the second
    pub second_misses: u64,
    /// First-lock releases after a second-lock miss
    pub retreats: u64,
    /// Protected increments performed
    pub successes: u64,
    /// Iterations consumed without an increment (single-shot only)
    pub skipped: u64,
    /// Longest run of consecutive misses
    pub max_streak: u64,
}

impl WorkerStats {
    pub fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            attempts: 0,
            first_misses: 0,
            second_misses: 0,
            retreats: 0,
            successes: 0,
            skipped: 0,
            max_streak: 0,
        }
    }

    /// Iterations accounted for, successful or not
    pub fn iterations(&self) -> u64 {
        self.successes + self.skipped
    }

    /// Fraction of attempts that ended in an increment
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

#[repr(align(64))]
#[derive(Debug, Default)]
struct PaddedCounter(AtomicU64);

/// Live per-worker success counts
#[derive(Debug, Default)]
pub struct Progress {
    successes: [PaddedCounter; 2],
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn record(&self, worker: WorkerId) {
        self.successes[worker.index()]
            .0
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, worker: WorkerId) -> u64 {
        self.successes[worker.index()].0.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> [u64; 2] {
        [self.get(WorkerId::A), self.get(WorkerId::B)]
    }

    pub fn total(&self) -> u64 {
        self.snapshot().iter().sum()
    }
}
