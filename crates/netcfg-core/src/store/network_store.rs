// ── Reconciliation store ──
//
// Owns the single `NetworkState` snapshot. The only mutator is
// `dispatch`; readers get cheap `Arc` clones and change notifications via
// synchronous listeners or a `watch` subscription.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::trace;

use super::StateStream;
use super::action::Action;
use super::reducer;
use crate::model::NetworkState;

type Listener = Arc<dyn Fn(&Arc<NetworkState>) + Send + Sync>;

/// Handle returned by [`NetworkStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Holder of the network snapshot.
///
/// `dispatch` is synchronous and may be called from any thread; the watch
/// sender serializes concurrent dispatches. Listener callbacks run after
/// the new snapshot is published, outside any internal lock, so they may
/// read the store or dispatch again.
pub struct NetworkStore {
    state: watch::Sender<Arc<NetworkState>>,
    listeners: DashMap<ListenerId, Listener>,
    next_listener: AtomicU64,
    last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl NetworkStore {
    pub fn new() -> Self {
        Self::with_state(NetworkState::default())
    }

    pub fn with_state(state: NetworkState) -> Self {
        let (state, _) = watch::channel(Arc::new(state));
        let (last_full_refresh, _) = watch::channel(None);
        Self {
            state,
            listeners: DashMap::new(),
            next_listener: AtomicU64::new(0),
            last_full_refresh,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current snapshot.
    pub fn state(&self) -> Arc<NetworkState> {
        self.state.borrow().clone()
    }

    /// Async subscription to snapshot changes.
    pub fn watch(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    pub(crate) fn mark_full_refresh(&self) {
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a transition. Returns `true` when the snapshot changed, in
    /// which case every listener has been called with the new snapshot.
    pub fn dispatch(&self, action: Action) -> bool {
        let kind = action.kind();
        let mut published = None;

        self.state
            .send_if_modified(|current| match reducer::reduce(current, action) {
                Some(next) => {
                    let next = Arc::new(next);
                    *current = Arc::clone(&next);
                    published = Some(next);
                    true
                }
                None => false,
            });

        let Some(snapshot) = published else {
            trace!(action = kind, "dispatch left state unchanged");
            return false;
        };
        trace!(action = kind, "dispatched");

        // Collect first so no DashMap shard lock is held while calling out.
        let listeners: Vec<Listener> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    /// Register a callback invoked after every state-changing dispatch.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Arc<NetworkState>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for NetworkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NetworkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("NetworkStore")
            .field("interfaces", &state.interfaces.len())
            .field("connections", &state.connections.len())
            .field("routes", &state.routes.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::Route;

    #[test]
    fn dispatch_notifies_listeners_with_new_snapshot() {
        let store = NetworkStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().unwrap().push(state.routes.len()));

        assert!(store.dispatch(Action::SetRoutes(vec![Route::new("10.0.0.0", "10.0.0.1")])));
        assert_eq!(*seen.lock().unwrap(), [1]);
        assert_eq!(store.state().routes.len(), 1);
    }

    #[test]
    fn no_change_means_no_notification() {
        let store = NetworkStore::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.dispatch(Action::Unknown));
        assert!(!store.dispatch(Action::SetRoutes(Vec::new())));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = NetworkStore::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));

        store.dispatch(Action::SetRoutes(vec![Route::new("a", "b")]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_the_store() {
        let store = Arc::new(NetworkStore::new());
        let inner = Arc::clone(&store);
        let matched = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&matched);
        store.subscribe(move |snapshot| {
            if Arc::ptr_eq(snapshot, &inner.state()) {
                flag.store(1, Ordering::SeqCst);
            }
        });
        store.dispatch(Action::SetRoutes(vec![Route::new("a", "b")]));
        assert_eq!(matched.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn old_snapshots_are_untouched() {
        let store = NetworkStore::new();
        let before = store.state();
        store.dispatch(Action::SetRoutes(vec![Route::new("a", "b")]));
        assert!(before.routes.is_empty());
    }

    #[test]
    fn full_refresh_timestamp() {
        let store = NetworkStore::new();
        assert!(store.last_full_refresh().is_none());
        store.mark_full_refresh();
        assert!(store.last_full_refresh().is_some());
    }
}
