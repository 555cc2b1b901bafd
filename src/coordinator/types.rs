/*!
 * Coordinator Types
 * Worker identities, lock identities, acquisition order and policy
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two symmetric workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerId {
    A,
    B,
}

impl WorkerId {
    pub const ALL: [WorkerId; 2] = [WorkerId::A, WorkerId::B];

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("worker-a"),
            Self::B => f.write_str("worker-b"),
        }
    }
}

/// One of the two shared locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockId {
    L1,
    L2,
}

impl LockId {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::L1 => 0,
            Self::L2 => 1,
        }
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1 => f.write_str("L1"),
            Self::L2 => f.write_str("L2"),
        }
    }
}

/// Sequence in which a worker attempts the two locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOrder {
    pub first: LockId,
    pub second: LockId,
}

impl LockOrder {
    /// L1 then L2, the global order
    pub const FORWARD: LockOrder = LockOrder::new(LockId::L1, LockId::L2);
    /// L2 then L1, the mirrored order
    pub const REVERSED: LockOrder = LockOrder::new(LockId::L2, LockId::L1);

    pub const fn new(first: LockId, second: LockId) -> Self {
        Self { first, second }
    }

    /// Both positions name distinct locks
    pub fn is_valid(&self) -> bool {
        self.first != self.second
    }

    pub fn reversed(self) -> Self {
        Self::new(self.second, self.first)
    }
}

impl fmt::Display for LockOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.first, self.second)
    }
}

/// What a worker does after taking its first lock and missing the second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquirePolicy {
    /// Release the first lock and restart from the top (hold-and-retreat)
    #[default]
    Retreat,
    /// Keep the first lock and spin on the second
    ///
    /// Deadlocks when the two workers use mirrored orders.
    HoldAndWait,
    /// One attempt per iteration; a miss consumes the iteration
    ///
    /// Always terminates but drops increments under contention.
    SingleShot,
}

/// Per-worker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub id: WorkerId,
    pub order: LockOrder,
    pub policy: AcquirePolicy,
}

impl WorkerConfig {
    pub const fn new(id: WorkerId, order: LockOrder, policy: AcquirePolicy) -> Self {
        Self { id, order, policy }
    }
}
