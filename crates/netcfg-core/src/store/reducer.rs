// ── Reducer ──
//
// Pure transition function. Given the current snapshot and an action it
// returns the next snapshot, or `None` when the action leaves state
// untouched. Anomalies (unknown names, unknown tags) are logged no-ops.

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::action::Action;
use crate::convert::synthesize_interface;
use crate::model::{Connection, EntityId, Interface, InterfaceStatus, NetworkState, Route};

/// Apply `action` to `state`.
pub fn reduce(state: &NetworkState, action: Action) -> Option<NetworkState> {
    match action {
        Action::SetInterfaces(interfaces) => {
            let interfaces = keyed(interfaces.into_iter().map(|mut iface| {
                iface.status = InterfaceStatus::Idle;
                iface.error = None;
                iface
            }));
            (!same_order(interfaces.iter(), state.interfaces.iter())).then(|| NetworkState {
                interfaces,
                ..state.clone()
            })
        }
        Action::SetConnections(connections) => {
            let connections = keyed(connections);
            (!same_order(connections.iter(), state.connections.iter())).then(|| NetworkState {
                connections,
                ..state.clone()
            })
        }
        Action::SetRoutes(routes) => {
            let routes = keyed(routes);
            (!same_order(routes.iter(), state.routes.iter())).then(|| NetworkState {
                routes,
                ..state.clone()
            })
        }
        Action::AddConnection(conn) => Some(add_connection(state, conn)),
        Action::UpdateConnection(conn) => update_connection(state, conn),
        Action::DeleteConnection(conn) => Some(delete_connection(state, &conn)),
        Action::UpdateInterface(iface) => update_interface(state, iface),
        Action::ConnectionError { connection, error } => {
            connection_error(state, &connection, error)
        }
        Action::Unknown => {
            warn!("ignoring unknown store action");
            None
        }
    }
}

trait Keyed {
    fn key(&self) -> EntityId;
}

impl Keyed for Interface {
    fn key(&self) -> EntityId {
        self.id.clone()
    }
}

impl Keyed for Connection {
    fn key(&self) -> EntityId {
        self.id.clone()
    }
}

impl Keyed for Route {
    fn key(&self) -> EntityId {
        self.id.clone()
    }
}

fn keyed<T: Keyed>(items: impl IntoIterator<Item = T>) -> IndexMap<EntityId, T> {
    items.into_iter().map(|item| (item.key(), item)).collect()
}

/// Order-sensitive comparison; `IndexMap`'s own `==` ignores order.
fn same_order<'a, T: PartialEq + 'a>(
    a: impl Iterator<Item = (&'a EntityId, &'a T)>,
    b: impl Iterator<Item = (&'a EntityId, &'a T)>,
) -> bool {
    a.eq(b)
}

fn interface_id_by_name(state: &NetworkState, name: &str) -> Option<EntityId> {
    state
        .interfaces
        .iter()
        .find(|(_, iface)| iface.name == name)
        .map(|(id, _)| id.clone())
}

fn mark_in_progress(iface: &mut Interface) {
    iface.status = InterfaceStatus::InProgress;
    iface.error = None;
}

// ── Connection transitions ──────────────────────────────────────────

fn add_connection(state: &NetworkState, conn: Connection) -> NetworkState {
    let mut next = state.clone();

    // One connection per name.
    next.connections
        .retain(|id, existing| *id == conn.id || existing.name != conn.name);

    match interface_id_by_name(&next, &conn.name) {
        Some(id) => {
            if let Some(iface) = next.interfaces.get_mut(&id) {
                mark_in_progress(iface);
            }
        }
        None => {
            let mut iface = synthesize_interface(&conn);
            mark_in_progress(&mut iface);
            next.interfaces.insert(iface.id.clone(), iface);
        }
    }

    next.connections.insert(conn.id.clone(), conn);
    next
}

fn update_connection(state: &NetworkState, conn: Connection) -> Option<NetworkState> {
    let Some(iface_id) = interface_id_by_name(state, &conn.name) else {
        warn!(
            connection = %conn.name,
            "update for connection without a matching interface, ignoring"
        );
        return None;
    };

    let mut next = state.clone();
    if let Some(iface) = next.interfaces.get_mut(&iface_id) {
        mark_in_progress(iface);
    }
    // A rename onto a taken name replaces the holder.
    next.connections
        .retain(|id, existing| *id == conn.id || existing.name != conn.name);
    next.connections.insert(conn.id.clone(), conn);
    Some(next)
}

fn delete_connection(state: &NetworkState, conn: &Connection) -> NetworkState {
    let mut next = state.clone();
    if next.connections.shift_remove(&conn.id).is_none() {
        debug!(connection = %conn.name, "deleting connection the store does not hold");
    }

    if let Some(iface_id) = interface_id_by_name(&next, &conn.name) {
        if conn.is_virtual {
            next.interfaces.shift_remove(&iface_id);
        } else if let Some(iface) = next.interfaces.get_mut(&iface_id) {
            mark_in_progress(iface);
        }
    }
    next
}

// ── Interface transitions ───────────────────────────────────────────

fn update_interface(state: &NetworkState, iface: Interface) -> Option<NetworkState> {
    let Some(id) = interface_id_by_name(state, &iface.name) else {
        debug!(interface = %iface.name, "update for undiscovered interface, ignoring");
        return None;
    };

    let updated = Interface {
        id: id.clone(),
        ..iface
    };
    if state.interfaces.get(&id) == Some(&updated) {
        return None;
    }

    let mut next = state.clone();
    next.interfaces.insert(id, updated);
    Some(next)
}

fn connection_error(
    state: &NetworkState,
    conn: &Connection,
    error: String,
) -> Option<NetworkState> {
    let Some(id) = interface_id_by_name(state, &conn.name) else {
        warn!(
            connection = %conn.name,
            error = %error,
            "error for connection without a matching interface, ignoring"
        );
        return None;
    };

    let mut next = state.clone();
    if let Some(iface) = next.interfaces.get_mut(&id) {
        iface.status = InterfaceStatus::Error;
        iface.error = Some(error);
    }
    Some(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::NewConnection;
    use crate::convert::{build_connection, create_interface};
    use crate::model::InterfaceKind;
    use crate::payload::InterfacePayload;
    use pretty_assertions::assert_eq;

    fn iface(name: &str) -> Interface {
        create_interface(InterfacePayload {
            name: name.into(),
            ..InterfacePayload::default()
        })
    }

    fn conn(name: &str, kind: InterfaceKind) -> Connection {
        let mut conn = build_connection(NewConnection::new(name, kind));
        conn.exists = true;
        conn
    }

    fn with_interfaces(names: &[&str]) -> NetworkState {
        reduce(
            &NetworkState::default(),
            Action::SetInterfaces(names.iter().map(|n| iface(n)).collect()),
        )
        .unwrap()
    }

    #[test]
    fn set_interfaces_resets_status() {
        let mut broken = iface("eth0");
        broken.status = InterfaceStatus::Error;
        broken.error = Some("boom".into());
        let state = reduce(&NetworkState::default(), Action::SetInterfaces(vec![broken])).unwrap();
        let eth0 = state.interface_by_name("eth0").unwrap();
        assert_eq!(eth0.status, InterfaceStatus::Idle);
        assert_eq!(eth0.error, None);
    }

    #[test]
    fn identical_resync_is_no_change() {
        let state = with_interfaces(&["eth0"]);
        let same: Vec<_> = state.interfaces().cloned().collect();
        assert!(reduce(&state, Action::SetInterfaces(same)).is_none());
    }

    #[test]
    fn set_routes_keeps_order() {
        let routes = vec![Route::new("b", "1"), Route::new("a", "2")];
        let state = reduce(&NetworkState::default(), Action::SetRoutes(routes)).unwrap();
        let order: Vec<_> = state
            .routes()
            .map(|r| r.destination.as_deref().unwrap())
            .collect();
        assert_eq!(order, ["b", "a"]);
    }

    #[test]
    fn add_connection_marks_existing_interface() {
        let state = with_interfaces(&["eth0"]);
        let next = reduce(
            &state,
            Action::AddConnection(conn("eth0", InterfaceKind::Ethernet)),
        )
        .unwrap();
        assert_eq!(next.interfaces.len(), 1);
        assert_eq!(
            next.interface_by_name("eth0").unwrap().status,
            InterfaceStatus::InProgress
        );
        assert_eq!(next.connections.len(), 1);
    }

    #[test]
    fn add_connection_synthesizes_interface() {
        let next = reduce(
            &NetworkState::default(),
            Action::AddConnection(conn("br0", InterfaceKind::Bridge)),
        )
        .unwrap();
        let br0 = next.interface_by_name("br0").unwrap();
        assert_eq!(br0.kind, InterfaceKind::Bridge);
        assert!(br0.is_virtual);
        assert!(br0.is_busy());
    }

    #[test]
    fn add_connection_replaces_same_name() {
        let state = with_interfaces(&["eth0"]);
        let first = reduce(
            &state,
            Action::AddConnection(conn("eth0", InterfaceKind::Ethernet)),
        )
        .unwrap();
        let second_conn = conn("eth0", InterfaceKind::Ethernet);
        let second = reduce(&first, Action::AddConnection(second_conn.clone())).unwrap();
        assert_eq!(second.connections.len(), 1);
        assert!(second.connection(&second_conn.id).is_some());
    }

    #[test]
    fn update_connection_without_interface_is_noop() {
        let state = NetworkState::default();
        assert!(
            reduce(
                &state,
                Action::UpdateConnection(conn("ghost0", InterfaceKind::Ethernet))
            )
            .is_none()
        );
    }

    #[test]
    fn update_connection_rename_keeps_names_unique() {
        let state = with_interfaces(&["eth0", "eth1"]);
        let eth0 = conn("eth0", InterfaceKind::Ethernet);
        let eth1 = conn("eth1", InterfaceKind::Ethernet);
        let state = reduce(&state, Action::AddConnection(eth0.clone())).unwrap();
        let state = reduce(&state, Action::AddConnection(eth1.clone())).unwrap();

        let mut renamed = eth0.clone();
        renamed.name = "eth1".into();
        let next = reduce(&state, Action::UpdateConnection(renamed.clone())).unwrap();

        let named_eth1: Vec<_> = next.connections().filter(|c| c.name == "eth1").collect();
        assert_eq!(named_eth1, [&renamed]);
        assert!(next.connection(&eth1.id).is_none());
    }

    #[test]
    fn update_connection_clears_error() {
        let state = with_interfaces(&["eth0"]);
        let c = conn("eth0", InterfaceKind::Ethernet);
        let failed = reduce(
            &state,
            Action::ConnectionError {
                connection: c.clone(),
                error: "boom".into(),
            },
        )
        .unwrap();
        assert!(failed.interface_by_name("eth0").unwrap().has_error());

        let next = reduce(&failed, Action::UpdateConnection(c.clone())).unwrap();
        let eth0 = next.interface_by_name("eth0").unwrap();
        assert_eq!(eth0.status, InterfaceStatus::InProgress);
        assert_eq!(eth0.error, None);
        assert_eq!(next.connection(&c.id), Some(&c));
    }

    #[test]
    fn delete_virtual_connection_removes_interface() {
        let state = with_interfaces(&["eth0"]);
        let bond = conn("bond0", InterfaceKind::Bond);
        let added = reduce(&state, Action::AddConnection(bond.clone())).unwrap();
        let next = reduce(&added, Action::DeleteConnection(bond)).unwrap();
        assert!(next.interface_by_name("bond0").is_none());
        assert!(next.connections.is_empty());
        assert!(next.interface_by_name("eth0").is_some());
    }

    #[test]
    fn delete_physical_connection_keeps_interface() {
        let state = with_interfaces(&["eth0"]);
        let c = conn("eth0", InterfaceKind::Ethernet);
        let state = reduce(&state, Action::SetConnections(vec![c.clone()])).unwrap();
        let next = reduce(&state, Action::DeleteConnection(c)).unwrap();
        let eth0 = next.interface_by_name("eth0").unwrap();
        assert_eq!(eth0.status, InterfaceStatus::InProgress);
        assert!(next.connections.is_empty());
    }

    #[test]
    fn update_interface_keeps_id() {
        let state = with_interfaces(&["eth0"]);
        let original_id = state.interface_by_name("eth0").unwrap().id.clone();

        let mut update = iface("eth0");
        update.link = true;
        update.description = "uplink".into();
        let next = reduce(&state, Action::UpdateInterface(update)).unwrap();

        let eth0 = next.interface_by_name("eth0").unwrap();
        assert_eq!(eth0.id, original_id);
        assert!(eth0.link);
        assert_eq!(eth0.description, "uplink");
    }

    #[test]
    fn update_unknown_interface_is_dropped() {
        let state = with_interfaces(&["eth0"]);
        assert!(reduce(&state, Action::UpdateInterface(iface("eth7"))).is_none());
    }

    #[test]
    fn connection_error_for_unknown_interface_is_noop() {
        let state = with_interfaces(&["eth0"]);
        let action = Action::ConnectionError {
            connection: conn("eth9", InterfaceKind::Ethernet),
            error: "nope".into(),
        };
        assert!(reduce(&state, action).is_none());
    }

    #[test]
    fn unknown_action_never_mutates() {
        let state = with_interfaces(&["eth0"]);
        assert!(reduce(&state, Action::Unknown).is_none());
    }
}
