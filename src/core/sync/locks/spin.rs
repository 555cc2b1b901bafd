/*!
 * Atomic Spin Lock
 * Test-and-test-and-set flag, cache-line aligned to prevent false sharing
 */

use super::traits::TryLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flag spin lock
///
/// # Performance
///
/// - Relaxed load before the compare-exchange keeps a contended line shared
///   instead of bouncing it on every failed attempt
/// - 64-byte alignment keeps L1 and L2 on separate cache lines
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl TryLock for SpinLock {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        !self.locked.load(Ordering::Relaxed)
            && self
                .locked
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
    }

    #[inline(always)]
    unsafe fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    fn name(&self) -> &'static str {
        "spin"
    }
}
