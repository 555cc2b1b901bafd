/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::coordinator::WorkerId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Abnormal outcomes of a run
///
/// A failed try-acquire is never an error; it is routine control flow that
/// triggers a retry. These variants only cover liveness problems and setup
/// failures.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CoordinatorError {
    #[error("{worker} gave up after {spins} consecutive failed attempts ({completed}/{required} increments)")]
    #[diagnostic(
        code(coordinator::liveness_failure),
        help("The worker could not acquire both locks. Check that both workers agree on lock order or retreat on failure.")
    )]
    LivenessFailure {
        worker: WorkerId,
        completed: u64,
        required: u64,
        spins: u64,
    },

    #[error("Deadlock detected: no progress for {stalled_for_ms}ms (progress a={}, b={})", .progress[0], .progress[1])]
    #[diagnostic(
        code(coordinator::deadlock),
        help("Both workers are likely holding one lock each while waiting for the other. Use consistent lock ordering or the retreat policy.")
    )]
    Deadlock {
        stalled_for_ms: u64,
        progress: [u64; 2],
    },

    #[error("{worker} cancelled after {completed} increments")]
    #[diagnostic(code(coordinator::cancelled))]
    Cancelled { worker: WorkerId, completed: u64 },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(coordinator::invalid_config),
        help("Lock orders must name two distinct locks and hardening limits must be non-zero.")
    )]
    InvalidConfig(String),

    #[error("Failed to spawn worker thread: {0}")]
    #[diagnostic(code(coordinator::spawn_failed))]
    Spawn(String),

    #[error("{0} panicked")]
    #[diagnostic(code(coordinator::worker_panicked))]
    WorkerPanicked(WorkerId),

    #[error("Coordinator thread exited without reporting")]
    #[diagnostic(code(coordinator::supervisor_lost))]
    SupervisorLost,
}

impl CoordinatorError {
    /// Whether this error is a liveness problem (deadlock or exhausted spin budget)
    pub fn is_liveness(&self) -> bool {
        matches!(self, Self::LivenessFailure { .. } | Self::Deadlock { .. })
    }
}
