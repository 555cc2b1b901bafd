/*!
 * Try-Lock Primitives
 *
 * Exclusive locks exposing only non-blocking acquisition:
 * - Atomic spin lock (single flag, cache-line aligned)
 * - parking_lot raw mutex (driven through `try_lock` only)
 */

mod exclusive;
mod parked;
mod spin;
mod traits;

// Re-export public API
pub use exclusive::ExclusiveLock;
pub use parked::ParkedLock;
pub use spin::SpinLock;
pub use traits::{Held, TryLock};
