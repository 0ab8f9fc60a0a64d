// ── Store subscriptions ──
//
// Change notification for consumers of the ThingsStore.

mod filter;

use std::sync::Arc;

use tokio::sync::watch;

pub use filter::ThingFilter;

use crate::store::StoreState;

/// A subscription to the store's state.
///
/// Every commit (refresh slice, push update, optimistic command) produces
/// one new snapshot; a slow reader only ever sees the newest.
pub struct StoreStream {
    receiver: watch::Receiver<Arc<StoreState>>,
}

impl StoreStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<StoreState>>) -> Self {
        Self { receiver }
    }

    /// The newest snapshot, without waiting.
    pub fn latest(&self) -> Arc<StoreState> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait for the next commit and return its snapshot.
    /// `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StoreState>> {
        self.receiver.changed().await.ok()?;
        Some(Arc::clone(&self.receiver.borrow_and_update()))
    }
}
