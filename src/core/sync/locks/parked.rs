/*!
 * parking_lot Raw Mutex
 *
 * Wraps `parking_lot::RawMutex` behind `TryLock`. Only `try_lock` is ever
 * called, so a thread never parks on this path; the primitive differs from
 * `SpinLock` in its fast-path encoding and unlock cost.
 */

use super::traits::TryLock;
use parking_lot::lock_api::RawMutex as RawMutexApi;
use parking_lot::RawMutex;
use std::fmt;

pub struct ParkedLock {
    raw: RawMutex,
}

impl ParkedLock {
    pub const fn new() -> Self {
        Self {
            raw: <RawMutex as RawMutexApi>::INIT,
        }
    }
}

impl Default for ParkedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParkedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkedLock")
            .field("locked", &self.raw.is_locked())
            .finish()
    }
}

impl TryLock for ParkedLock {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        self.raw.try_lock()
    }

    #[inline(always)]
    unsafe fn release(&self) {
        // SAFETY: forwarded from the trait contract
        unsafe { self.raw.unlock() }
    }

    fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    fn name(&self) -> &'static str {
        "parked"
    }
}
