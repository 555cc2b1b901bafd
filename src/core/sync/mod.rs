/*!
 * Synchronization Primitives
 *
 * Building blocks for the dual-lock experiment:
 * - Try-lock primitives (atomic spin lock, parking_lot raw mutex)
 * - Spin-wait policy with an optional bound on consecutive misses
 * - Cancellation token and a cancel-aware rendezvous
 *
 * # Architecture
 *
 * Every lock is driven through `TryLock::try_acquire`; nothing here blocks.
 * Callers own the retry loop and decide what a miss means.
 */

mod cancel;
mod config;
mod rendezvous;
mod spinwait;

pub mod locks;

pub use cancel::CancelToken;
pub use config::{LockKind, SpinPolicy, SyncConfig};
pub use locks::{ExclusiveLock, Held, ParkedLock, SpinLock, TryLock};
pub use rendezvous::Rendezvous;
pub use spinwait::{SpinExhausted, SpinWait};
