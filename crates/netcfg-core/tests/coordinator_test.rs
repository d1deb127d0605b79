#![allow(clippy::unwrap_used)]
// Integration tests for `Coordinator` using a scripted in-memory backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::{Semaphore, broadcast};

use netcfg_core::payload::{
    AddressPayload, BridgePayload, ConnectionPayload, ControlPayload, FamilyPayload,
    InterfacePayload, LinkPayload,
};
use netcfg_core::{
    Address, Backend, BackendError, BootProtocol, BridgeOptions, Command, CommandResult,
    Connection, ConnectionChanges, Coordinator, CoordinatorConfig, CoreError, EntityId,
    InterfaceKind, InterfaceStatus, IpConfig, NewConnection, Route,
};

// ── Scripted backend ────────────────────────────────────────────────

struct ScriptedBackend {
    interfaces: Mutex<Vec<InterfacePayload>>,
    connections: Mutex<Vec<ConnectionPayload>>,
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, String>>,
    gate: Option<Arc<Semaphore>>,
    changes: broadcast::Sender<InterfacePayload>,
}

impl ScriptedBackend {
    fn new(interface_names: &[&str]) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            interfaces: Mutex::new(
                interface_names
                    .iter()
                    .map(|name| InterfacePayload {
                        name: (*name).into(),
                        ..InterfacePayload::default()
                    })
                    .collect(),
            ),
            connections: Mutex::new(Vec::new()),
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            gate: None,
            changes,
        }
    }

    /// Block every `add_connection` until a permit is added to the gate.
    fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn fail(&self, operation: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation, message.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, subject: &str) -> Result<(), BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation} {subject}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(message) => Err(BackendError::rejected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn interfaces(&self) -> Result<Vec<InterfacePayload>, BackendError> {
        Ok(self.interfaces.lock().unwrap().clone())
    }

    async fn connections(&self) -> Result<Vec<ConnectionPayload>, BackendError> {
        Ok(self.connections.lock().unwrap().clone())
    }

    async fn routes(&self) -> Result<Vec<Route>, BackendError> {
        Ok(self.routes.lock().unwrap().clone())
    }

    async fn add_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        if let Some(gate) = &self.gate {
            self.calls
                .lock()
                .unwrap()
                .push(format!("waiting {}", connection.name));
            gate.acquire().await.unwrap().forget();
        }
        self.record("add_connection", &connection.name)
    }

    async fn update_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        self.record("update_connection", &connection.name)
    }

    async fn remove_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        self.record("remove_connection", &connection.name)
    }

    async fn reload_connection(&self, name: &str) -> Result<(), BackendError> {
        self.record("reload_connection", name)
    }

    async fn set_up(&self, name: &str) -> Result<(), BackendError> {
        self.record("set_up", name)
    }

    async fn set_down(&self, name: &str) -> Result<(), BackendError> {
        self.record("set_down", name)
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<(), BackendError> {
        self.record("update_routes", &routes.len().to_string())?;
        *self.routes.lock().unwrap() = routes.to_vec();
        Ok(())
    }

    fn interface_changes(&self) -> broadcast::Receiver<InterfacePayload> {
        self.changes.subscribe()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, Coordinator) {
    let backend = Arc::new(backend);
    let coordinator = Coordinator::new(backend.clone(), CoordinatorConfig::default());
    coordinator.refresh().await.unwrap();
    (backend, coordinator)
}

fn address(local: &str) -> Address {
    Address {
        id: EntityId::generate(),
        local: local.into(),
        label: String::new(),
    }
}

fn dhcp(name: &str) -> NewConnection {
    NewConnection {
        ipv4: IpConfig::dhcp(),
        ..NewConnection::new(name, InterfaceKind::Ethernet)
    }
}

/// Let spawned tasks run until `done` holds.
async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_adds_placeholders_for_unconfigured_interfaces() {
    let backend = ScriptedBackend::new(&["eth0", "eth1"]);
    backend.connections.lock().unwrap().push(ConnectionPayload {
        name: "eth0".into(),
        control: Some(ControlPayload {
            mode: Some("boot".into()),
            ..ControlPayload::default()
        }),
        ..ConnectionPayload::default()
    });
    let (_, coordinator) = setup(backend).await;

    let state = coordinator.state();
    assert_eq!(state.interfaces.len(), 2);
    assert!(state.connection_by_name("eth0").unwrap().exists);
    assert!(state.connection_by_name("eth1").unwrap().is_placeholder());
    assert!(coordinator.store().last_full_refresh().is_some());
}

#[tokio::test]
async fn test_refresh_keeps_ids_stable() {
    let (_, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let before = coordinator.state();
    coordinator.refresh().await.unwrap();
    let after = coordinator.state();

    assert_eq!(
        before.interface_by_name("eth0").unwrap().id,
        after.interface_by_name("eth0").unwrap().id
    );
    assert_eq!(
        before.connection_by_name("eth0").unwrap().id,
        after.connection_by_name("eth0").unwrap().id
    );
}

// ── Add ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_connection_success() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;

    let conn = coordinator.add_connection(dhcp("eth0")).await.unwrap();
    assert!(conn.exists);

    let state = coordinator.state();
    assert_eq!(state.connections.len(), 1);
    assert_eq!(state.connection(&conn.id), Some(&conn));
    assert_eq!(
        state.interface_by_name("eth0").unwrap().status,
        InterfaceStatus::InProgress
    );
    assert_eq!(
        backend.calls(),
        ["add_connection eth0", "reload_connection eth0"]
    );
}

#[tokio::test]
async fn test_add_connection_failure_lands_in_store() {
    let backend = ScriptedBackend::new(&["eth0"]);
    backend.fail("add_connection", "permission denied");
    let (backend, coordinator) = setup(backend).await;

    let conn = coordinator.add_connection(dhcp("eth0")).await.unwrap();
    assert!(!conn.exists);

    let iface = coordinator.state().interface_by_name("eth0").cloned().unwrap();
    assert_eq!(iface.status, InterfaceStatus::Error);
    assert_eq!(
        iface.error.as_deref(),
        Some("rejected: permission denied")
    );
    assert_eq!(backend.calls(), ["add_connection eth0"]);
}

#[tokio::test]
async fn test_add_virtual_connection_synthesizes_interface() {
    let (_, coordinator) = setup(ScriptedBackend::new(&["eth0", "eth1"])).await;

    let mut request = NewConnection::new("br0", InterfaceKind::Bridge);
    request.bridge = Some(BridgeOptions {
        ports: vec!["eth0".into(), "eth1".into()],
    });
    coordinator.add_connection(request).await.unwrap();

    let br0 = coordinator.state().interface_by_name("br0").cloned().unwrap();
    assert!(br0.is_virtual);
    assert_eq!(br0.kind, InterfaceKind::Bridge);
}

#[tokio::test]
async fn test_invalid_connection_never_reaches_store() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let before = coordinator.state();

    let mut request = NewConnection::new("eth0", InterfaceKind::Ethernet);
    request.ipv4 = IpConfig::with_addresses(vec![address("not-an-ip")]);
    let err = coordinator.add_connection(request).await.unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)), "got {err:?}");
    assert!(Arc::ptr_eq(&before, &coordinator.state()));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_validation_can_be_disabled() {
    let backend = Arc::new(ScriptedBackend::new(&["eth0"]));
    let coordinator = Coordinator::new(
        backend,
        CoordinatorConfig {
            validate: false,
            ..CoordinatorConfig::default()
        },
    );
    coordinator.refresh().await.unwrap();

    let mut request = NewConnection::new("eth0", InterfaceKind::Ethernet);
    request.ipv4 = IpConfig::with_addresses(vec![address("not-an-ip")]);
    assert!(coordinator.add_connection(request).await.is_ok());
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_connection_merges_and_preserves_other_family() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let mut request = dhcp("eth0");
    request.ipv6 = IpConfig::dhcp();
    let conn = coordinator.add_connection(request).await.unwrap();

    let changes = ConnectionChanges {
        ipv4: Some(IpConfig::with_addresses(vec![address("192.168.1.5/24")])),
        ..ConnectionChanges::default()
    };
    let updated = coordinator
        .update_connection(&conn.id, changes)
        .await
        .unwrap();

    assert_eq!(updated.id, conn.id);
    assert_eq!(updated.ipv4.boot_proto, BootProtocol::Static);
    assert_eq!(updated.ipv6, conn.ipv6);
    assert_eq!(coordinator.state().connection(&conn.id), Some(&updated));
    assert_eq!(
        backend.calls()[2..].to_vec(),
        ["update_connection eth0", "reload_connection eth0"]
    );
}

#[tokio::test]
async fn test_update_unknown_connection_is_an_error() {
    let (_, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let err = coordinator
        .update_connection(&EntityId::generate(), ConnectionChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ConnectionNotFound { .. }));
}

#[tokio::test]
async fn test_reload_failure_after_update() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let conn = coordinator.add_connection(dhcp("eth0")).await.unwrap();
    backend.fail("reload_connection", "ifup failed");

    coordinator
        .update_connection(
            &conn.id,
            ConnectionChanges {
                mtu: Some(9000),
                ..ConnectionChanges::default()
            },
        )
        .await
        .unwrap();

    let state = coordinator.state();
    assert_eq!(state.connection(&conn.id).unwrap().mtu, Some(9000));
    assert!(state.interface_by_name("eth0").unwrap().has_error());
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_physical_connection() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let conn = coordinator.add_connection(dhcp("eth0")).await.unwrap();

    coordinator.delete_connection(&conn.id).await.unwrap();

    let state = coordinator.state();
    assert!(state.connection(&conn.id).is_none());
    assert!(state.interface_by_name("eth0").unwrap().is_busy());
    assert_eq!(
        backend.calls()[2..].to_vec(),
        ["remove_connection eth0", "set_down eth0"]
    );
}

#[tokio::test]
async fn test_delete_virtual_connection_removes_interface() {
    let (_, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let bond = coordinator
        .add_connection(NewConnection::new("bond0", InterfaceKind::Bond))
        .await
        .unwrap();

    coordinator.delete_connection(&bond.id).await.unwrap();
    assert!(coordinator.state().interface_by_name("bond0").is_none());
}

// ── Interface state ─────────────────────────────────────────────────

#[tokio::test]
async fn test_set_interface_state_has_no_optimistic_transition() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let before = coordinator.state();

    let conn = coordinator.set_interface_state("eth0", true).await.unwrap();
    assert_eq!(conn.name, "eth0");
    assert!(Arc::ptr_eq(&before, &coordinator.state()));
    assert_eq!(backend.calls(), ["set_up eth0"]);
}

#[tokio::test]
async fn test_set_interface_state_failure() {
    let backend = ScriptedBackend::new(&["eth0"]);
    backend.fail("set_down", "device busy");
    let (_, coordinator) = setup(backend).await;

    coordinator.set_interface_state("eth0", false).await.unwrap();
    let iface = coordinator.state().interface_by_name("eth0").cloned().unwrap();
    assert_eq!(iface.status, InterfaceStatus::Error);
    assert_eq!(iface.error.as_deref(), Some("rejected: device busy"));
}

#[tokio::test]
async fn test_set_state_of_unknown_interface() {
    let (_, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let err = coordinator
        .set_interface_state("eth9", true)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InterfaceNotFound { ref name } if name == "eth9"));
}

// ── Routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_routes() {
    let (backend, coordinator) = setup(ScriptedBackend::new(&["eth0"])).await;
    let routes = vec![Route::new("default", "192.168.1.1")];

    coordinator.update_routes(routes.clone()).await.unwrap();
    assert_eq!(
        coordinator.state().routes().cloned().collect::<Vec<_>>(),
        routes
    );
    assert_eq!(*backend.routes.lock().unwrap(), routes);
}

#[tokio::test]
async fn test_update_routes_failure_restores_backend_routes() {
    let backend = ScriptedBackend::new(&["eth0"]);
    let original = Route::new("10.0.0.0/8", "10.0.0.1");
    backend.routes.lock().unwrap().push(original.clone());
    backend.fail("update_routes", "read-only filesystem");
    let (_, coordinator) = setup(backend).await;

    let err = coordinator
        .update_routes(vec![Route::new("default", "192.168.1.1")])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Backend { .. }));

    let routes: Vec<_> = coordinator.state().routes().cloned().collect();
    assert_eq!(routes.len(), 1);
    assert!(routes[0].same_as(&original));
}

// ── Serialization ───────────────────────────────────────────────────

#[tokio::test]
async fn test_operations_on_same_name_queue() {
    let gate = Arc::new(Semaphore::new(0));
    let (backend, coordinator) =
        setup(ScriptedBackend::new(&["eth0", "eth1"]).gated(gate.clone())).await;

    let first = coordinator.submit(Command::AddConnection(dhcp("eth0")));
    settle(|| backend.calls() == ["waiting eth0"]).await;
    assert_eq!(coordinator.busy_names(), 1);

    let second = coordinator.submit(Command::AddConnection(dhcp("eth0")));
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    // Second add is still queued: no optimistic dispatch, no backend call.
    assert_eq!(backend.calls(), ["waiting eth0"]);
    let pending = coordinator.state();
    assert_eq!(pending.connections().filter(|c| c.name == "eth0").count(), 1);

    gate.add_permits(2);
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let (CommandResult::Connection(first), CommandResult::Connection(second)) = (first, second)
    else {
        panic!("expected connections");
    };
    let state = coordinator.state();
    assert!(state.connection(&first.id).is_none());
    assert!(state.connection(&second.id).is_some());
    assert_eq!(
        backend.calls(),
        [
            "waiting eth0",
            "add_connection eth0",
            "reload_connection eth0",
            "waiting eth0",
            "add_connection eth0",
            "reload_connection eth0",
        ]
    );
    assert_eq!(coordinator.busy_names(), 0);
}

#[tokio::test]
async fn test_different_names_interleave() {
    let gate = Arc::new(Semaphore::new(0));
    let (backend, coordinator) =
        setup(ScriptedBackend::new(&["eth0", "eth1"]).gated(gate.clone())).await;
    let conn = coordinator.state().connection_by_name("eth1").cloned().unwrap();

    let blocked = coordinator.submit(Command::AddConnection(dhcp("eth0")));
    settle(|| backend.calls() == ["waiting eth0"]).await;

    coordinator
        .execute(Command::UpdateConnection {
            id: conn.id.clone(),
            changes: ConnectionChanges {
                ipv4: Some(IpConfig::dhcp()),
                ..ConnectionChanges::default()
            },
        })
        .await
        .unwrap();
    assert!(backend.calls().contains(&"update_connection eth1".to_owned()));

    assert_eq!(coordinator.busy_names(), 1);

    gate.add_permits(1);
    blocked.await.unwrap().unwrap();
    assert_eq!(coordinator.busy_names(), 0);
}

// ── Interface notifications ─────────────────────────────────────────

#[tokio::test]
async fn test_watcher_applies_interface_updates() {
    let backend = Arc::new(ScriptedBackend::new(&["eth0"]));
    let coordinator = Coordinator::new(backend.clone(), CoordinatorConfig::default());
    coordinator.start().await.unwrap();
    let id = coordinator.state().interface_by_name("eth0").unwrap().id.clone();

    backend
        .changes
        .send(InterfacePayload {
            name: "eth0".into(),
            link: Some(LinkPayload {
                up: Some(true),
                ..LinkPayload::default()
            }),
            ..InterfacePayload::default()
        })
        .unwrap();

    let store = coordinator.store().clone();
    settle(|| store.state().interface_by_name("eth0").is_some_and(|i| i.link)).await;
    assert_eq!(coordinator.state().interface_by_name("eth0").unwrap().id, id);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_notification_returns_busy_interface_to_idle() {
    let backend = Arc::new(ScriptedBackend::new(&["eth0"]));
    let coordinator = Coordinator::new(backend.clone(), CoordinatorConfig::default());
    coordinator.start().await.unwrap();

    coordinator.add_connection(dhcp("eth0")).await.unwrap();
    assert!(coordinator.state().interface_by_name("eth0").unwrap().is_busy());

    backend
        .changes
        .send(InterfacePayload {
            name: "eth0".into(),
            ..InterfacePayload::default()
        })
        .unwrap();
    let store = coordinator.store().clone();
    settle(|| {
        store
            .state()
            .interface_by_name("eth0")
            .is_some_and(|i| i.status == InterfaceStatus::Idle)
    })
    .await;

    coordinator.shutdown().await;
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_static_connection_from_backend_payload() {
    let backend = ScriptedBackend::new(&["eth0", "br0"]);
    backend.connections.lock().unwrap().extend([
        ConnectionPayload {
            name: "eth0".into(),
            ipv4: Some(FamilyPayload {
                dhcp: None,
                static_addresses: vec![AddressPayload {
                    local: "192.168.1.5".into(),
                    ..AddressPayload::default()
                }],
            }),
            ..ConnectionPayload::default()
        },
        ConnectionPayload {
            name: "br0".into(),
            bridge: Some(BridgePayload {
                ports: vec!["eth1".into()],
            }),
            ..ConnectionPayload::default()
        },
    ]);
    let (_, coordinator) = setup(backend).await;

    let state = coordinator.state();
    let eth0 = state.connection_by_name("eth0").unwrap();
    assert_eq!(eth0.ipv4.boot_proto, BootProtocol::Static);
    assert_eq!(eth0.ipv4.addresses.len(), 1);
    assert_eq!(eth0.ipv4.addresses[0].local, "192.168.1.5");

    let br0 = state.connection_by_name("br0").unwrap();
    assert_eq!(br0.kind, InterfaceKind::Bridge);
    assert_eq!(br0.bridge.as_ref().unwrap().ports, ["eth1"]);
}
