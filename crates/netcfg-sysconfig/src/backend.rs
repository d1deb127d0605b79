// ── Sysconfig backend ──
//
// Persists connections as `ifcfg-<name>` files and routes as `routes` /
// `ifroute-<name>` files under the sysconfig directory, and reads link
// state from sysfs. Activating interfaces is left to the network service:
// reload and link requests are acknowledged and answered with the current
// interface state.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use netcfg_core::codec::{
    decode_routes, encode_interface_config, encode_routes, parse_ifcfg, render_ifcfg,
};
use netcfg_core::payload::{ConnectionPayload, InterfacePayload, LinkPayload};
use netcfg_core::{Backend, BackendError, Connection, Route};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::files::{is_valid_name, list_prefixed, read_optional, remove_if_exists, write_atomic};
use crate::ifcfg_payload::connection_payload;
use crate::options::{IFCFG_PREFIX, IFROUTE_PREFIX, SysconfigOptions};
use crate::sysfs;

const CHANGES_CAPACITY: usize = 64;

/// [`Backend`] over sysconfig files and sysfs.
pub struct SysconfigBackend {
    options: SysconfigOptions,
    /// Link state requested for configured virtual devices that have no
    /// sysfs entry yet.
    requested_links: DashMap<String, bool>,
    changes: broadcast::Sender<InterfacePayload>,
}

impl SysconfigBackend {
    pub fn new(options: SysconfigOptions) -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            options,
            requested_links: DashMap::new(),
            changes,
        }
    }

    pub fn options(&self) -> &SysconfigOptions {
        &self.options
    }

    /// Broadcast an interface notification. Having no subscribers is fine.
    pub(crate) fn notify(&self, payload: InterfacePayload) {
        let _ = self.changes.send(payload);
    }

    // ── Reads ──────────────────────────────────────────────────────

    async fn read_connection(&self, name: &str) -> Result<Option<ConnectionPayload>, BackendError> {
        let path = self.options.ifcfg_path(name);
        let text = read_optional(&path).await?;
        Ok(text.map(|text| connection_payload(name, &parse_ifcfg(&text))))
    }

    /// A configured virtual device that sysfs does not show yet.
    fn declared_interface(&self, connection: &ConnectionPayload) -> Option<InterfacePayload> {
        let is_virtual = connection.bridge.is_some()
            || connection.bond.is_some()
            || connection.vlan.is_some()
            || connection.kind.as_deref() == Some("dummy");
        if !is_virtual {
            return None;
        }
        let up = self
            .requested_links
            .get(&connection.name)
            .is_some_and(|entry| *entry.value());
        Some(InterfacePayload {
            name: connection.name.clone(),
            kind: connection.kind.clone(),
            link: Some(LinkPayload {
                up: Some(up),
                ..LinkPayload::default()
            }),
            bridge: connection.bridge.clone(),
            bond: connection.bond.clone(),
            vlan: connection.vlan.clone(),
            ..InterfacePayload::default()
        })
    }

    /// Current state of one interface, from sysfs or the declared set.
    async fn current_interface(&self, name: &str) -> Result<Option<InterfacePayload>, BackendError> {
        if let Some(payload) = sysfs::discover_one(&self.options.sysfs_dir, name).await {
            return Ok(Some(payload));
        }
        Ok(self
            .read_connection(name)
            .await?
            .and_then(|c| self.declared_interface(&c)))
    }

    async fn set_link(&self, name: &str, up: bool) -> Result<(), BackendError> {
        if let Some(payload) = sysfs::discover_one(&self.options.sysfs_dir, name).await {
            debug!(interface = name, up, "link change left to the network service");
            self.notify(payload);
            return Ok(());
        }
        let Some(connection) = self.read_connection(name).await? else {
            // Nothing left to take down, e.g. right after the config was removed.
            if !up {
                debug!(interface = name, "no device or config, already down");
                return Ok(());
            }
            return Err(BackendError::NotFound {
                name: name.to_owned(),
            });
        };
        if self.declared_interface(&connection).is_none() {
            debug!(interface = name, up, "no device yet");
            return Ok(());
        }
        self.requested_links.insert(name.to_owned(), up);
        if let Some(payload) = self.declared_interface(&connection) {
            self.notify(payload);
        }
        Ok(())
    }

    async fn has_config(&self, name: &str) -> Result<bool, BackendError> {
        Ok(read_optional(&self.options.ifcfg_path(name)).await?.is_some())
    }

    async fn write_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        let name = checked_name(&connection.name)?;
        let text = render_ifcfg(&encode_interface_config(connection));
        write_atomic(&self.options.ifcfg_path(name), &text).await?;
        debug!(connection = name, "wrote ifcfg file");
        Ok(())
    }
}

impl std::fmt::Debug for SysconfigBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysconfigBackend")
            .field("options", &self.options)
            .field("requested_links", &self.requested_links.len())
            .finish_non_exhaustive()
    }
}

fn checked_name(name: &str) -> Result<&str, BackendError> {
    if is_valid_name(name) {
        Ok(name)
    } else {
        Err(BackendError::rejected(format!("invalid interface name {name:?}")))
    }
}

/// Point bond slaves and bridge ports at their master.
fn link_masters(connections: &mut [ConnectionPayload]) {
    let mut masters: HashMap<String, String> = HashMap::new();
    for connection in connections.iter() {
        let members = connection
            .bond
            .iter()
            .flat_map(|b| b.slaves.iter())
            .chain(connection.bridge.iter().flat_map(|b| b.ports.iter()));
        for member in members {
            masters.insert(member.clone(), connection.name.clone());
        }
    }
    for connection in connections.iter_mut() {
        if let Some(master) = masters.get(&connection.name) {
            connection.link.get_or_insert_with(LinkPayload::default).master = Some(master.clone());
        }
    }
}

#[async_trait]
impl Backend for SysconfigBackend {
    async fn interfaces(&self) -> Result<Vec<InterfacePayload>, BackendError> {
        let mut interfaces = sysfs::discover(&self.options.sysfs_dir).await?;
        let present: HashSet<String> = interfaces.iter().map(|i| i.name.clone()).collect();

        for connection in self.connections().await? {
            if present.contains(&connection.name) {
                continue;
            }
            if let Some(declared) = self.declared_interface(&connection) {
                interfaces.push(declared);
            }
        }
        Ok(interfaces)
    }

    async fn connections(&self) -> Result<Vec<ConnectionPayload>, BackendError> {
        let mut connections = Vec::new();
        for name in list_prefixed(&self.options.sysconfig_dir, IFCFG_PREFIX).await? {
            if let Some(payload) = self.read_connection(&name).await? {
                connections.push(payload);
            }
        }
        link_masters(&mut connections);
        Ok(connections)
    }

    async fn routes(&self) -> Result<Vec<Route>, BackendError> {
        let mut routes = Vec::new();
        if let Some(text) = read_optional(&self.options.routes_path()).await? {
            routes.extend(decode_routes(&text, None));
        }
        for device in list_prefixed(&self.options.sysconfig_dir, IFROUTE_PREFIX).await? {
            if let Some(text) = read_optional(&self.options.ifroute_path(&device)).await? {
                routes.extend(decode_routes(&text, Some(&device)));
            }
        }
        Ok(routes)
    }

    async fn add_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        self.write_connection(connection).await?;
        info!(connection = %connection.name, "connection added");
        Ok(())
    }

    async fn update_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        self.write_connection(connection).await?;
        info!(connection = %connection.name, "connection updated");
        Ok(())
    }

    async fn remove_connection(&self, connection: &Connection) -> Result<(), BackendError> {
        let name = checked_name(&connection.name)?;
        let removed = remove_if_exists(&self.options.ifcfg_path(name)).await?;
        remove_if_exists(&self.options.ifroute_path(name)).await?;
        self.requested_links.remove(name);
        info!(connection = name, removed, "connection removed");
        Ok(())
    }

    async fn reload_connection(&self, name: &str) -> Result<(), BackendError> {
        match self.current_interface(name).await? {
            Some(payload) => {
                debug!(connection = name, "reload left to the network service");
                self.notify(payload);
                Ok(())
            }
            None if self.has_config(name).await? => {
                debug!(connection = name, "no device yet");
                Ok(())
            }
            None => Err(BackendError::NotFound {
                name: name.to_owned(),
            }),
        }
    }

    async fn set_up(&self, name: &str) -> Result<(), BackendError> {
        self.set_link(name, true).await
    }

    async fn set_down(&self, name: &str) -> Result<(), BackendError> {
        self.set_link(name, false).await
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<(), BackendError> {
        let mut global = Vec::new();
        let mut by_device: BTreeMap<&str, Vec<Route>> = BTreeMap::new();
        for route in routes {
            match route.device.as_deref() {
                Some(device) => by_device
                    .entry(checked_name(device)?)
                    .or_default()
                    .push(route.clone()),
                None => global.push(route.clone()),
            }
        }

        write_atomic(&self.options.routes_path(), &encode_routes(&global)).await?;
        for (device, device_routes) in &by_device {
            write_atomic(&self.options.ifroute_path(device), &encode_routes(device_routes)).await?;
        }

        for stale in list_prefixed(&self.options.sysconfig_dir, IFROUTE_PREFIX).await? {
            if !by_device.contains_key(stale.as_str()) {
                remove_if_exists(&self.options.ifroute_path(&stale)).await?;
                debug!(device = %stale, "removed stale ifroute file");
            }
        }

        info!(routes = routes.len(), devices = by_device.len(), "routes written");
        Ok(())
    }

    fn interface_changes(&self) -> broadcast::Receiver<InterfacePayload> {
        self.changes.subscribe()
    }
}
