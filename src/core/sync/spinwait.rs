/*!
 * Spin-Wait Between Failed Attempts
 *
 * A worker that misses a lock calls `SpinWait::miss` before retrying.
 * `Busy` keeps the thread hot with a `spin_loop` hint. `Backoff` follows the
 * three-phase scheme:
 *
 * 1. **Tight spin phase** (0-10 misses): just `spin_loop()` hint
 * 2. **Yield phase** (10-50 misses): `yield_now()` every miss
 * 3. **Sleep phase** (50+ misses): exponentially increasing sleep, capped at 1ms
 *
 * `SpinWait` also owns the consecutive-miss counter used by the bounded-retry
 * hardening.
 */

use super::config::SpinPolicy;
use crate::core::limits::{BACKOFF_MAX_SLEEP_NS, BACKOFF_SPIN_PHASE, BACKOFF_YIELD_PHASE};
use std::thread;
use std::time::Duration;

/// Spin limit exceeded; carries the number of consecutive misses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinExhausted(pub u64);

/// Per-worker retry state
#[derive(Debug)]
pub struct SpinWait {
    policy: SpinPolicy,
    limit: Option<u64>,
    streak: u64,
    max_streak: u64,
    backoff_ns: u64,
}

impl SpinWait {
    pub fn new(policy: SpinPolicy, limit: Option<u64>) -> Self {
        Self {
            policy,
            limit,
            streak: 0,
            max_streak: 0,
            backoff_ns: 1,
        }
    }

    /// Record one failed attempt and pause according to the policy
    ///
    /// A limit of `n` tolerates `n` consecutive misses; miss `n + 1` returns
    /// `Err` and the caller must stop retrying.
    #[inline]
    pub fn miss(&mut self) -> Result<(), SpinExhausted> {
        self.streak += 1;
        if self.streak > self.max_streak {
            self.max_streak = self.streak;
        }

        if let Some(limit) = self.limit {
            if self.streak > limit {
                return Err(SpinExhausted(self.streak));
            }
        }

        match self.policy {
            SpinPolicy::Busy => std::hint::spin_loop(),
            SpinPolicy::Backoff => self.back_off(),
        }
        Ok(())
    }

    /// Record a success, resetting the streak and the backoff
    #[inline]
    pub fn reset(&mut self) {
        self.streak = 0;
        self.backoff_ns = 1;
    }

    /// Consecutive misses since the last reset
    pub fn streak(&self) -> u64 {
        self.streak
    }

    /// Longest streak seen so far
    pub fn max_streak(&self) -> u64 {
        self.max_streak
    }

    fn back_off(&mut self) {
        if self.streak < BACKOFF_SPIN_PHASE as u64 {
            std::hint::spin_loop();
        } else if self.streak < BACKOFF_YIELD_PHASE as u64 {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_nanos(self.backoff_ns));
            self.backoff_ns = (self.backoff_ns * 2).min(BACKOFF_MAX_SLEEP_NS);
        }
    }
}
