/*!
 * Dual-Lock Coordinator
 *
 * Two symmetric workers, two shared locks, one counter. Each worker needs
 * both locks for every increment and only ever tries them without blocking.
 * Deadlock freedom comes from configuration: a common lock order, or
 * retreating from the first lock when the second is taken.
 */

mod baseline;
mod manager;
mod pair;
mod types;
mod worker;

// Re-export public API
pub use baseline::{run_baseline, Baseline, BaselineReport};
pub use manager::{Coordinator, CoordinatorConfig, RunHandle, RunReport};
pub use pair::{BothHeld, LockPair, PairHeld};
pub use types::{AcquirePolicy, LockId, LockOrder, WorkerConfig, WorkerId};
pub use worker::{run_worker, WorkerEnv};
