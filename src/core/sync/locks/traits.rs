/*!
 * Try-Lock Abstraction
 *
 * Exclusive locks driven only through non-blocking acquisition. A failed
 * attempt is ordinary control flow; callers decide whether to retry, retreat
 * or give up.
 */

use std::fmt;
use std::marker::PhantomData;

/// Exclusive lock with a non-blocking acquire and an unconditional release
///
/// Implementations must be:
/// - **Thread-safe**: `try_acquire` may race from any number of threads
/// - **Non-blocking**: `try_acquire` returns immediately, never parks
/// - **Non-reentrant**: a second `try_acquire` by the holder fails
pub trait TryLock: Send + Sync {
    /// Attempt to take the lock, returning `true` on success
    fn try_acquire(&self) -> bool;

    /// Release the lock
    ///
    /// # Safety
    ///
    /// The calling thread must currently hold the lock through a successful
    /// `try_acquire` that has not been released yet.
    unsafe fn release(&self);

    /// Whether some thread currently holds the lock (racy, diagnostics only)
    fn is_locked(&self) -> bool;

    /// Primitive name for logging
    fn name(&self) -> &'static str;

    /// Attempt to take the lock, returning an RAII guard on success
    #[inline]
    fn try_hold(&self) -> Option<Held<'_, Self>>
    where
        Self: Sized,
    {
        if self.try_acquire() {
            Some(Held {
                lock: self,
                _not_send: PhantomData,
            })
        } else {
            None
        }
    }
}

/// Ownership of a `TryLock`, released on drop
///
/// Not `Send`: the release must happen on the thread that acquired.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct Held<'a, L: TryLock> {
    lock: &'a L,
    _not_send: PhantomData<*const ()>,
}

impl<L: TryLock> Drop for Held<'_, L> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: a `Held` only exists after a successful `try_acquire` on
        // this thread, and it is dropped exactly once.
        unsafe { self.lock.release() }
    }
}

impl<L: TryLock> fmt::Debug for Held<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Held").field("lock", &self.lock.name()).finish()
    }
}
