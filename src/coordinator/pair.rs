/*!
 * Lock Pair
 *
 * L1, L2 and the counter they jointly protect.
 *
 * # Design: Proof of Ownership
 *
 * The counter is a plain cell, not an atomic. The only way to touch it is
 * through `BothHeld`, which can only be built from guards on two distinct
 * locks of the same pair. "Never increment without holding both" is
 * therefore a type error rather than a convention.
 *
 * An occupancy gauge counts live `BothHeld` values. Entering while the gauge
 * is non-zero means two workers were inside the protected section at once,
 * which is recorded as an exclusion violation.
 */

use super::types::LockId;
use crate::core::sync::{ExclusiveLock, Held, LockKind, TryLock};
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub struct LockPair {
    locks: [ExclusiveLock; 2],
    counter: UnsafeCell<u64>,
    occupancy: AtomicU32,
    violations: AtomicU64,
}

// SAFETY: `counter` is only read or written through a `BothHeld`, which
// requires both locks to be held by the current thread, or through
// `&mut self`. Every other field is already `Sync`.
unsafe impl Sync for LockPair {}

impl LockPair {
    pub fn new(kind: LockKind) -> Self {
        Self {
            locks: [ExclusiveLock::new(kind), ExclusiveLock::new(kind)],
            counter: UnsafeCell::new(0),
            occupancy: AtomicU32::new(0),
            violations: AtomicU64::new(0),
        }
    }

    /// Lock primitive backing this pair
    pub fn kind(&self) -> LockKind {
        self.locks[0].kind()
    }

    /// Non-blocking attempt on one lock of the pair
    #[inline(always)]
    pub fn try_hold(&self, id: LockId) -> Option<PairHeld<'_>> {
        self.locks[id.index()].try_hold().map(|guard| PairHeld {
            pair: self,
            id,
            _guard: guard,
        })
    }

    /// Whether `id` is currently held by anyone (racy, diagnostics only)
    pub fn is_locked(&self, id: LockId) -> bool {
        self.locks[id.index()].is_locked()
    }

    /// Read the counter if both locks are free right now
    pub fn try_read(&self) -> Option<u64> {
        let first = self.try_hold(LockId::L1)?;
        let second = self.try_hold(LockId::L2)?;
        BothHeld::new(first, second).map(|both| both.value())
    }

    /// Read the counter, spinning until both locks can be taken
    ///
    /// Intended for after the workers have been joined, when it returns on
    /// the first attempt.
    pub fn snapshot(&self) -> u64 {
        loop {
            if let Some(value) = self.try_read() {
                return value;
            }
            std::hint::spin_loop();
        }
    }

    /// Consume the pair and return the final counter
    pub fn into_value(self) -> u64 {
        self.counter.into_inner()
    }

    /// Number of times two workers were inside the protected section at once
    pub fn exclusion_violations(&self) -> u64 {
        self.violations.load(Ordering::Acquire)
    }
}

impl fmt::Debug for LockPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockPair")
            .field("kind", &self.kind())
            .field("l1_locked", &self.is_locked(LockId::L1))
            .field("l2_locked", &self.is_locked(LockId::L2))
            .field("violations", &self.exclusion_violations())
            .finish()
    }
}

/// One lock of a pair, held by the current thread
#[must_use = "dropping the guard releases the lock immediately"]
pub struct PairHeld<'a> {
    pair: &'a LockPair,
    id: LockId,
    _guard: Held<'a, ExclusiveLock>,
}

impl fmt::Debug for PairHeld<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairHeld").field("id", &self.id).finish()
    }
}

/// Both locks of a pair held by the current thread
///
/// Releases both on drop, in field order.
pub struct BothHeld<'a> {
    pair: &'a LockPair,
    _first: PairHeld<'a>,
    _second: PairHeld<'a>,
}

impl<'a> BothHeld<'a> {
    /// Combine two guards into a proof of joint ownership
    ///
    /// Returns `None`, releasing both guards, if they belong to different
    /// pairs or name the same lock.
    pub fn new(first: PairHeld<'a>, second: PairHeld<'a>) -> Option<Self> {
        if !std::ptr::eq(first.pair, second.pair) || first.id == second.id {
            return None;
        }

        let pair = first.pair;
        if pair.occupancy.fetch_add(1, Ordering::AcqRel) != 0 {
            pair.violations.fetch_add(1, Ordering::AcqRel);
        }

        Some(Self {
            pair,
            _first: first,
            _second: second,
        })
    }

    /// Add one to the shared counter, returning the new value
    #[inline(always)]
    pub fn increment(&mut self) -> u64 {
        // SAFETY: both locks of `pair` are held by this thread for the
        // lifetime of `self`, so no other reference to the cell is live.
        unsafe {
            let counter = &mut *self.pair.counter.get();
            *counter += 1;
            *counter
        }
    }

    /// Current counter value
    #[inline(always)]
    pub fn value(&self) -> u64 {
        // SAFETY: as in `increment`
        unsafe { *self.pair.counter.get() }
    }
}

impl Drop for BothHeld<'_> {
    fn drop(&mut self) {
        // Runs before the guards are dropped, so the gauge falls while both
        // locks are still held.
        self.pair.occupancy.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for BothHeld<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BothHeld")
            .field("value", &self.value())
            .finish()
    }
}
