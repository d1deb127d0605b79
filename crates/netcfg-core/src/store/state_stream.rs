use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::NetworkState;

/// Async view of a [`NetworkStore`](super::NetworkStore), from
/// [`watch`](super::NetworkStore::watch).
pub struct StateStream {
    current: Arc<NetworkState>,
    receiver: watch::Receiver<Arc<NetworkState>>,
}

impl StateStream {
    pub(super) fn new(receiver: watch::Receiver<Arc<NetworkState>>) -> Self {
        let current = Arc::clone(&receiver.borrow());
        Self { current, receiver }
    }

    /// Snapshot seen last by this subscriber.
    pub fn current(&self) -> &Arc<NetworkState> {
        &self.current
    }

    pub fn latest(&self) -> Arc<NetworkState> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Next snapshot after [`current`](Self::current). `None` once the
    /// store is gone.
    pub async fn changed(&mut self) -> Option<Arc<NetworkState>> {
        self.receiver.changed().await.ok()?;
        let snapshot = Arc::clone(&self.receiver.borrow_and_update());
        self.current = Arc::clone(&snapshot);
        Some(snapshot)
    }

    /// First snapshot, current one included, that satisfies `accept`.
    ///
    /// Used to wait for reconciliation, e.g. an interface returning to
    /// `idle` after a backend notification.
    pub async fn wait_for(
        &mut self,
        mut accept: impl FnMut(&NetworkState) -> bool,
    ) -> Option<Arc<NetworkState>> {
        let snapshot = {
            let seen = self.receiver.wait_for(|state| accept(state)).await.ok()?;
            Arc::clone(&seen)
        };
        self.current = Arc::clone(&snapshot);
        Some(snapshot)
    }

    /// Every snapshot from now on, starting with the latest.
    pub fn into_stream(self) -> impl Stream<Item = Arc<NetworkState>> + Send + Unpin {
        WatchStream::new(self.receiver)
    }
}
