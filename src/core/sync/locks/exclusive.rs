/*!
 * Exclusive Lock
 *
 * Enum dispatch over the available `TryLock` primitives, selected at runtime
 * from `LockKind` without a vtable on the hot path.
 */

use super::parked::ParkedLock;
use super::spin::SpinLock;
use super::traits::TryLock;
use crate::core::sync::config::LockKind;

#[derive(Debug)]
pub enum ExclusiveLock {
    Spin(SpinLock),
    Parked(ParkedLock),
}

impl ExclusiveLock {
    pub fn new(kind: LockKind) -> Self {
        match kind {
            LockKind::Spin => Self::Spin(SpinLock::new()),
            LockKind::Parked => Self::Parked(ParkedLock::new()),
        }
    }

    pub fn kind(&self) -> LockKind {
        match self {
            Self::Spin(_) => LockKind::Spin,
            Self::Parked(_) => LockKind::Parked,
        }
    }
}

impl TryLock for ExclusiveLock {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        match self {
            Self::Spin(l) => l.try_acquire(),
            Self::Parked(l) => l.try_acquire(),
        }
    }

    #[inline(always)]
    unsafe fn release(&self) {
        // SAFETY: forwarded from the trait contract
        unsafe {
            match self {
                Self::Spin(l) => l.release(),
                Self::Parked(l) => l.release(),
            }
        }
    }

    fn is_locked(&self) -> bool {
        match self {
            Self::Spin(l) => l.is_locked(),
            Self::Parked(l) => l.is_locked(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Spin(l) => l.name(),
            Self::Parked(l) => l.name(),
        }
    }
}
