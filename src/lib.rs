/*!
 * Dual-Lock Library
 * Two-worker, two-lock mutual exclusion experiment built on try-lock retries
 */

pub mod coordinator;
pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{CoordinatorError, CoordinatorResult};
pub use crate::core::limits::ITERATIONS;
pub use crate::core::sync::{CancelToken, LockKind, SpinPolicy, SyncConfig};
pub use coordinator::{
    AcquirePolicy, Coordinator, CoordinatorConfig, LockId, LockOrder, RunHandle, RunReport,
    WorkerConfig, WorkerId,
};
pub use monitoring::{init_tracing, WorkerStats};
