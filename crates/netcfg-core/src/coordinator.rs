// ── Sync coordinator ──
//
// Runs every user-initiated change as an optimistic two-phase operation:
// dispatch to the store first, then call the backend and reconcile the
// outcome. Operations on the same connection name are serialized; different
// names interleave freely.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::command::{Command, CommandResult, ConnectionChanges, NewConnection};
use crate::config::CoordinatorConfig;
use crate::convert::{
    build_connection, create_connection, create_interface, merge_connection,
    placeholder_connection,
};
use crate::error::CoreError;
use crate::model::{Connection, EntityId, Interface, NetworkState, Route};
use crate::payload::InterfacePayload;
use crate::store::{Action, NetworkStore};
use crate::validate::validate_connection;

// ── Coordinator ──────────────────────────────────────────────────

/// Entry point for user-initiated changes.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. The backend is injected
/// at construction; there is no global instance.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    backend: Arc<dyn Backend>,
    store: Arc<NetworkStore>,
    /// One async lock per connection name.
    entity_locks: DashMap<String, Arc<Mutex<()>>>,
    routes_lock: Mutex<()>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(backend: Arc<dyn Backend>, config: CoordinatorConfig) -> Self {
        Self::with_store(backend, Arc::new(NetworkStore::new()), config)
    }

    /// Use an existing store, e.g. one a UI already subscribed to.
    pub fn with_store(
        backend: Arc<dyn Backend>,
        store: Arc<NetworkStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                backend,
                store,
                entity_locks: DashMap::new(),
                routes_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<NetworkStore> {
        &self.inner.store
    }

    pub fn state(&self) -> Arc<NetworkState> {
        self.inner.store.state()
    }

    /// Connection names with an operation running or queued.
    pub fn busy_names(&self) -> usize {
        self.inner.entity_locks.len()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load the initial snapshot and spawn the interface watcher.
    pub async fn start(&self) -> Result<(), CoreError> {
        // Subscribe before the refresh so no notification falls in between.
        let changes = self
            .inner
            .config
            .watch_interfaces
            .then(|| self.inner.backend.interface_changes());

        self.refresh().await?;

        if let Some(rx) = changes {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(interface_watch_task(coordinator, rx, cancel)));
        }

        info!("coordinator started");
        Ok(())
    }

    /// Cancel background tasks and wait for them to finish. In-flight
    /// operations are not interrupted.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    /// Re-read interfaces, connections and routes from the backend and
    /// replace the store contents.
    ///
    /// Entities already in the store keep their ids when the backend does
    /// not supply one. Interfaces without a connection get a placeholder.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let backend = &self.inner.backend;
        let (interfaces, connections, routes) =
            tokio::join!(backend.interfaces(), backend.connections(), backend.routes());
        let interfaces = interfaces.map_err(|e| CoreError::backend("discover interfaces", &e))?;
        let connections =
            connections.map_err(|e| CoreError::backend("discover connections", &e))?;
        let routes = routes.map_err(|e| CoreError::backend("discover routes", &e))?;

        let current = self.state();

        let interfaces: Vec<Interface> = interfaces
            .into_iter()
            .map(|payload| {
                let has_id = payload.id.is_some();
                let mut iface = create_interface(payload);
                if !has_id {
                    if let Some(existing) = current.interface_by_name(&iface.name) {
                        iface.id = existing.id.clone();
                    }
                }
                iface
            })
            .collect();

        let mut connections: Vec<Connection> = connections
            .into_iter()
            .map(|payload| {
                let has_id = payload.id.is_some();
                let mut conn = create_connection(payload);
                if !has_id {
                    if let Some(existing) = current.connection_by_name(&conn.name) {
                        conn.id = existing.id.clone();
                    }
                }
                conn
            })
            .collect();

        for iface in &interfaces {
            if connections.iter().any(|c| c.name == iface.name) {
                continue;
            }
            let mut placeholder = placeholder_connection(iface);
            if let Some(existing) = current.connection_by_name(&iface.name) {
                placeholder.id = existing.id.clone();
            }
            connections.push(placeholder);
        }

        let mut reused = HashSet::new();
        let routes: Vec<Route> = routes
            .into_iter()
            .map(|mut route| {
                if let Some(existing) = current
                    .routes()
                    .find(|r| r.same_as(&route) && !reused.contains(&r.id))
                {
                    route.id = existing.id.clone();
                    reused.insert(existing.id.clone());
                }
                route
            })
            .collect();

        let store = &self.inner.store;
        store.dispatch(Action::SetInterfaces(interfaces));
        store.dispatch(Action::SetConnections(connections));
        store.dispatch(Action::SetRoutes(routes));
        store.mark_full_refresh();

        let state = store.state();
        debug!(
            interfaces = state.interfaces.len(),
            connections = state.connections.len(),
            routes = state.routes.len(),
            "refresh complete"
        );
        Ok(())
    }

    // ── Connection operations ────────────────────────────────────

    /// Create a connection.
    ///
    /// Resolves to the attempted connection whatever the backend outcome;
    /// backend failures land in the store as `CONNECTION_ERROR`.
    pub async fn add_connection(&self, request: NewConnection) -> Result<Connection, CoreError> {
        let mut conn = build_connection(request);
        self.check(&conn)?;

        let _guard = self.lock_entity(&conn.name).await;
        self.inner
            .store
            .dispatch(Action::AddConnection(conn.clone()));

        let backend = &self.inner.backend;
        let result: Result<(), BackendError> = async {
            backend.add_connection(&conn).await?;
            if !conn.exists {
                conn.exists = true;
                self.inner
                    .store
                    .dispatch(Action::UpdateConnection(conn.clone()));
            }
            backend.reload_connection(&conn.name).await
        }
        .await;

        match result {
            Ok(()) => info!(connection = %conn.name, "connection added"),
            Err(e) => self.report_failure(&conn, "add", &e),
        }
        Ok(conn)
    }

    /// Apply `changes` to the connection with `id`.
    pub async fn update_connection(
        &self,
        id: &EntityId,
        changes: ConnectionChanges,
    ) -> Result<Connection, CoreError> {
        let name = self.connection(id)?.name;
        let _guard = self.lock_entity(&name).await;

        // Re-read: an operation queued ahead of us may have changed it.
        let current = self.connection(id)?;
        let conn = merge_connection(&current, changes);
        self.check(&conn)?;

        self.inner
            .store
            .dispatch(Action::UpdateConnection(conn.clone()));

        let backend = &self.inner.backend;
        let result: Result<(), BackendError> = async {
            backend.update_connection(&conn).await?;
            backend.reload_connection(&conn.name).await
        }
        .await;

        match result {
            Ok(()) => info!(connection = %conn.name, "connection updated"),
            Err(e) => self.report_failure(&conn, "update", &e),
        }
        Ok(conn)
    }

    /// Remove the connection with `id` and take its interface down.
    pub async fn delete_connection(&self, id: &EntityId) -> Result<Connection, CoreError> {
        let name = self.connection(id)?.name;
        let _guard = self.lock_entity(&name).await;
        let conn = self.connection(id)?;

        self.inner
            .store
            .dispatch(Action::DeleteConnection(conn.clone()));

        let backend = &self.inner.backend;
        let result: Result<(), BackendError> = async {
            backend.remove_connection(&conn).await?;
            backend.set_down(&conn.name).await
        }
        .await;

        match result {
            Ok(()) => info!(connection = %conn.name, "connection deleted"),
            Err(e) => self.report_failure(&conn, "delete", &e),
        }
        Ok(conn)
    }

    /// Bring an interface up or down. The store only changes when the
    /// backend fails or reports the new link state.
    pub async fn set_interface_state(&self, name: &str, up: bool) -> Result<Connection, CoreError> {
        let _guard = self.lock_entity(name).await;

        let state = self.state();
        let conn = match (state.connection_by_name(name), state.interface_by_name(name)) {
            (Some(conn), _) => conn.clone(),
            (None, Some(iface)) => placeholder_connection(iface),
            (None, None) => {
                return Err(CoreError::InterfaceNotFound { name: name.into() });
            }
        };

        let backend = &self.inner.backend;
        let (operation, result) = if up {
            ("set up", backend.set_up(name).await)
        } else {
            ("set down", backend.set_down(name).await)
        };

        match result {
            Ok(()) => debug!(interface = name, up, "link state requested"),
            Err(e) => self.report_failure(&conn, operation, &e),
        }
        Ok(conn)
    }

    // ── Routes ───────────────────────────────────────────────────

    /// Replace the static routes.
    ///
    /// Routes have no per-interface error slot, so a backend failure
    /// restores the backend's routes in the store and returns the error.
    pub async fn update_routes(&self, routes: Vec<Route>) -> Result<Vec<Route>, CoreError> {
        let _guard = self.inner.routes_lock.lock().await;
        let store = &self.inner.store;
        store.dispatch(Action::SetRoutes(routes.clone()));

        let backend = &self.inner.backend;
        match backend.update_routes(&routes).await {
            Ok(()) => {
                info!(routes = routes.len(), "routes updated");
                Ok(routes)
            }
            Err(e) => {
                warn!(error = %e, "route update failed, restoring backend routes");
                match backend.routes().await {
                    Ok(restored) => {
                        store.dispatch(Action::SetRoutes(restored));
                    }
                    Err(reread) => warn!(error = %reread, "could not re-read routes"),
                }
                Err(CoreError::backend("update routes", &e))
            }
        }
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command and wait for it.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        match cmd {
            Command::AddConnection(request) => self
                .add_connection(request)
                .await
                .map(CommandResult::Connection),
            Command::UpdateConnection { id, changes } => self
                .update_connection(&id, changes)
                .await
                .map(CommandResult::Connection),
            Command::DeleteConnection { id } => self
                .delete_connection(&id)
                .await
                .map(CommandResult::Connection),
            Command::SetInterfaceState { name, up } => self
                .set_interface_state(&name, up)
                .await
                .map(CommandResult::Connection),
            Command::UpdateRoutes(routes) => {
                self.update_routes(routes).await.map(CommandResult::Routes)
            }
            Command::Refresh => self.refresh().await.map(|()| CommandResult::Ok),
        }
    }

    /// Spawn a command and return its pending handle.
    pub fn submit(&self, cmd: Command) -> JoinHandle<Result<CommandResult, CoreError>> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.execute(cmd).await })
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn connection(&self, id: &EntityId) -> Result<Connection, CoreError> {
        self.state()
            .connection(id)
            .cloned()
            .ok_or_else(|| CoreError::ConnectionNotFound {
                identifier: id.to_string(),
            })
    }

    fn check(&self, conn: &Connection) -> Result<(), CoreError> {
        if self.inner.config.validate {
            validate_connection(conn)?;
        }
        Ok(())
    }

    /// Wait until no other operation holds `name`.
    async fn lock_entity(&self, name: &str) -> EntityGuard<'_> {
        let locks = &self.inner.entity_locks;
        let lock = Arc::clone(locks.entry(name.to_owned()).or_default().value());
        EntityGuard {
            locks,
            name: name.to_owned(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn report_failure(&self, conn: &Connection, operation: &str, err: &BackendError) {
        warn!(connection = %conn.name, operation, error = %err, "backend operation failed");
        self.inner.store.dispatch(Action::ConnectionError {
            connection: conn.clone(),
            error: err.to_string(),
        });
    }
}

/// Holds one connection name; the map entry goes away with the last holder.
struct EntityGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means nobody else
        // is queued on this name.
        self.locks
            .remove_if(&self.name, |_, lock| Arc::strong_count(lock) == 1);
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Feed backend interface notifications into the store.
async fn interface_watch_task(
    coordinator: Coordinator,
    mut rx: broadcast::Receiver<InterfacePayload>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(payload) => {
                    let iface = create_interface(payload);
                    coordinator.store().dispatch(Action::UpdateInterface(iface));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "interface notifications lagged, resyncing");
                    if let Err(e) = coordinator.refresh().await {
                        warn!(error = %e, "resync after lag failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("interface notification channel closed");
                    break;
                }
            }
        }
    }
}
