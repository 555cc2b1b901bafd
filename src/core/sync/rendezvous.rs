/*!
 * Rendezvous
 *
 * Spinning barrier that releases once every party has arrived. Unlike
 * `std::sync::Barrier` it polls a `CancelToken`, so a party waiting for a
 * peer that never shows up can still be stopped.
 *
 * One-shot: the arrival count never resets, so a passed barrier stays open.
 */

use super::cancel::CancelToken;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Inner {
    parties: usize,
    arrived: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct Rendezvous {
    inner: Arc<Inner>,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                parties,
                arrived: AtomicUsize::new(0),
            }),
        }
    }

    /// Arrive and spin until all parties have arrived
    ///
    /// Returns `false` if cancelled first.
    pub fn arrive(&self, cancel: &CancelToken) -> bool {
        self.inner.arrived.fetch_add(1, Ordering::AcqRel);
        while self.inner.arrived.load(Ordering::Acquire) < self.inner.parties {
            if cancel.is_cancelled() {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// Parties that have arrived so far
    pub fn arrived(&self) -> usize {
        self.inner.arrived.load(Ordering::Acquire)
    }
}
