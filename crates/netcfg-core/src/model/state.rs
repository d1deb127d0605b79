// ── Store snapshot ──
//
// The full reconciled view of interfaces, connections and routes. Held by
// `NetworkStore` behind an `Arc`; every transition produces a new value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::connection::Connection;
use super::entity_id::EntityId;
use super::interface::Interface;
use super::route::Route;

/// Immutable snapshot of everything the store owns.
///
/// Each collection is keyed by entity id and keeps insertion order, so
/// consumers render entities in the order the backend reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    pub interfaces: IndexMap<EntityId, Interface>,
    pub connections: IndexMap<EntityId, Connection>,
    pub routes: IndexMap<EntityId, Route>,
}

impl NetworkState {
    // ── Interfaces ───────────────────────────────────────────────────

    pub fn interface(&self, id: &EntityId) -> Option<&Interface> {
        self.interfaces.get(id)
    }

    pub fn interface_by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.values().find(|i| i.name == name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    // ── Connections ──────────────────────────────────────────────────

    pub fn connection(&self, id: &EntityId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connection_by_name(&self, name: &str) -> Option<&Connection> {
        self.connections.values().find(|c| c.name == name)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections enslaved to `master` (bond slaves, bridge ports).
    pub fn connections_used_by<'a>(
        &'a self,
        master: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .values()
            .filter(move |c| c.used_by.as_deref() == Some(master))
    }

    // ── Routes ───────────────────────────────────────────────────────

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Routes bound to `device`.
    pub fn routes_for<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a Route> + 'a {
        self.routes
            .values()
            .filter(move |r| r.device.as_deref() == Some(device))
    }
}
