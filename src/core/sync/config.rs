/*!
 * Synchronization Configuration
 *
 * Selection of the lock primitive and the spin behaviour used while retrying
 */

use serde::{Deserialize, Serialize};

/// Lock primitive backing each lock of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Single atomic flag, compare-exchange on acquire
    #[default]
    Spin,
    /// `parking_lot::RawMutex`, only ever driven through `try_lock`
    Parked,
}

/// What a worker does between two failed try-acquire attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPolicy {
    /// Tight spin with a `spin_loop` hint, never yields
    #[default]
    Busy,
    /// Spin, then yield, then exponentially growing sleep (capped)
    Backoff,
}

/// Synchronization configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Lock primitive for both L1 and L2
    pub lock_kind: LockKind,
    /// Retry behaviour on a failed attempt
    pub spin_policy: SpinPolicy,
}

impl SyncConfig {
    /// Pure busy-wait on atomic spin locks
    pub const fn busy_spin() -> Self {
        Self {
            lock_kind: LockKind::Spin,
            spin_policy: SpinPolicy::Busy,
        }
    }

    /// Backoff over `parking_lot` raw mutexes, for oversubscribed machines
    pub const fn polite() -> Self {
        Self {
            lock_kind: LockKind::Parked,
            spin_policy: SpinPolicy::Backoff,
        }
    }
}
