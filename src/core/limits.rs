/*!
 * Experiment Limits and Constants
 *
 * Centralized location for the iteration budget and hardening defaults.
 */

use std::time::Duration;

// =============================================================================
// ITERATION BUDGET
// =============================================================================

/// Increments each worker must complete in the binary run (10M)
/// Compile-time constant, no runtime override
pub const ITERATIONS: u64 = 10_000_000;

/// Number of workers contending for the lock pair
pub const WORKER_COUNT: usize = 2;

// =============================================================================
// HARDENING DEFAULTS
// =============================================================================

/// Consecutive failed attempts tolerated by the bounded-retry preset
/// High enough that a healthy run under heavy contention never trips it
pub const DEFAULT_SPIN_LIMIT: u64 = 50_000_000;

/// Watchdog stall window used by the bounded presets
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Watchdog polling interval
/// [PERF] Coordinator sleeps between samples so it does not compete with workers
pub const WATCHDOG_POLL_INTERVAL: Duration = Duration::from_millis(5);

// =============================================================================
// BACKOFF
// =============================================================================

/// Spins with a bare `spin_loop` hint before backoff starts yielding
pub const BACKOFF_SPIN_PHASE: u32 = 10;

/// Spins that yield to the scheduler before backoff starts sleeping
pub const BACKOFF_YIELD_PHASE: u32 = 50;

/// Upper bound on a single backoff sleep (1ms)
pub const BACKOFF_MAX_SLEEP_NS: u64 = 1_000_000;
