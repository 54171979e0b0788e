//! Single-flight mutation queue.

use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Admits one mutation at a time, in arrival order.
///
/// Backed by [`tokio::sync::Mutex`], whose waiters are woken first-in,
/// first-out. Holding a [`MutationPermit`] is the only way to mutate the
/// preset map.
#[derive(Debug, Default)]
pub struct MutationQueue {
    lock: Mutex<()>,
}

/// Proof of exclusive access to the preset map. Released on drop.
#[derive(Debug)]
pub struct MutationPermit<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl MutationQueue {
    /// Creates an idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until every earlier mutation has finished, then admits the caller.
    pub async fn admit(&self) -> MutationPermit<'_> {
        let guard = self.lock.lock().await;
        trace!("mutation admitted");
        MutationPermit { _guard: guard }
    }
}
