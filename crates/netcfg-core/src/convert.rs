// ── Payload-to-domain conversions ──
//
// The model factory. Turns backend payloads and UI requests into canonical
// `netcfg_core::model` types, applying every defaulting and inference rule
// in one place. Nothing here touches the store.

use std::collections::HashSet;

use tracing::warn;

use crate::command::{AddressDraft, ConnectionChanges, NewConnection};
use crate::model::{
    Address, BondOptions, BootProtocol, BridgeOptions, Connection, EntityId, Interface,
    InterfaceKind, InterfaceStatus, IpConfig, MacAddress, StartMode, VlanOptions,
};
use crate::payload::{
    AddressPayload, BondPayload, BridgePayload, ConnectionPayload, ControlPayload, FamilyPayload,
    InterfacePayload, VlanPayload,
};

/// Name the kernel gives the loopback device.
const LOOPBACK_NAME: &str = "lo";

// ── Helpers ────────────────────────────────────────────────────────

fn id_or_generate(raw: Option<String>) -> EntityId {
    raw.filter(|s| !s.is_empty())
        .map_or_else(EntityId::generate, EntityId::from)
}

/// Infer the kind of an interface or connection.
///
/// Sub-payloads are the strongest signal, then an explicit type hint, then
/// a wireless sub-payload, then the loopback name. Anything else is plain
/// ethernet.
fn infer_kind(
    name: &str,
    hint: Option<&str>,
    bridge: bool,
    bond: bool,
    vlan: bool,
    wireless: bool,
) -> InterfaceKind {
    if bridge {
        return InterfaceKind::Bridge;
    }
    if bond {
        return InterfaceKind::Bond;
    }
    if vlan {
        return InterfaceKind::Vlan;
    }
    if let Some(kind) = hint.and_then(|h| h.parse::<InterfaceKind>().ok()) {
        return kind;
    }
    if wireless {
        InterfaceKind::Wireless
    } else if name == LOOPBACK_NAME {
        InterfaceKind::Loopback
    } else {
        InterfaceKind::Ethernet
    }
}

fn map_start_mode(name: &str, control: Option<&ControlPayload>) -> StartMode {
    let Some(control) = control else {
        return StartMode::Off;
    };
    match control.mode.as_deref() {
        Some("boot" | "auto") => {
            if control.boot_stage.as_deref() == Some("localfs") && control.persistent {
                StartMode::Nfsroot
            } else {
                StartMode::Auto
            }
        }
        Some("nfsroot") => StartMode::Nfsroot,
        Some("hotplug") => StartMode::Hotplug,
        Some("ifplugd") => StartMode::Ifplugd,
        Some("manual") => StartMode::Manual,
        None | Some("off") => StartMode::Off,
        Some(other) => {
            warn!(connection = name, mode = other, "unknown start mode, using off");
            StartMode::Off
        }
    }
}

fn map_family(family: Option<FamilyPayload>) -> IpConfig {
    let Some(family) = family else {
        return IpConfig::default();
    };
    let dhcp = family.dhcp.is_some_and(|d| d.enabled);
    let addresses = sanitize_addresses(
        family
            .static_addresses
            .into_iter()
            .map(address_from_payload)
            .collect(),
    );
    let boot_proto = if dhcp {
        BootProtocol::Dhcp
    } else if addresses.is_empty() {
        BootProtocol::None
    } else {
        BootProtocol::Static
    };
    IpConfig {
        boot_proto,
        addresses,
    }
}

fn address_from_payload(payload: AddressPayload) -> Address {
    create_address(AddressDraft {
        id: payload.id.filter(|s| !s.is_empty()).map(EntityId::from),
        local: Some(payload.local),
        label: Some(payload.label),
    })
}

fn bond_options(payload: Option<BondPayload>) -> BondOptions {
    let Some(payload) = payload else {
        return BondOptions::default();
    };
    let defaults = BondOptions::default();
    BondOptions {
        mode: payload
            .mode
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.mode),
        interfaces: payload.slaves,
        options: payload.options.unwrap_or_default(),
    }
}

fn bridge_options(payload: Option<BridgePayload>) -> BridgeOptions {
    BridgeOptions {
        ports: payload.map(|b| b.ports).unwrap_or_default(),
    }
}

fn vlan_options(payload: Option<VlanPayload>) -> Option<VlanOptions> {
    let payload = payload?;
    Some(VlanOptions {
        vlan_id: payload.tag?,
        parent_device: payload.device.unwrap_or_default(),
    })
}

fn sanitize_family(config: IpConfig) -> IpConfig {
    IpConfig {
        boot_proto: config.boot_proto,
        addresses: sanitize_addresses(config.addresses),
    }
}

// ── Interface ──────────────────────────────────────────────────────

/// Build an Interface from a discovery payload.
pub fn create_interface(payload: InterfacePayload) -> Interface {
    let kind = infer_kind(
        &payload.name,
        payload.kind.as_deref(),
        payload.bridge.is_some(),
        payload.bond.is_some(),
        payload.vlan.is_some(),
        payload.wireless.is_some(),
    );
    Interface {
        id: id_or_generate(payload.id),
        mac: payload
            .ethernet
            .and_then(|e| e.address)
            .filter(|a| !a.is_empty())
            .map(MacAddress::new),
        driver: payload.driver_info.and_then(|d| d.driver),
        description: payload.description.unwrap_or_default(),
        link: payload.link.and_then(|l| l.up).unwrap_or(false),
        status: InterfaceStatus::Idle,
        error: None,
        is_virtual: kind.is_virtual(),
        kind,
        name: payload.name,
    }
}

/// Interface stand-in for a connection whose device is not known yet,
/// e.g. a virtual interface that is about to be created.
pub fn synthesize_interface(connection: &Connection) -> Interface {
    Interface {
        id: EntityId::generate(),
        name: connection.name.clone(),
        description: String::new(),
        kind: connection.kind,
        mac: None,
        driver: None,
        link: false,
        status: InterfaceStatus::Idle,
        error: None,
        is_virtual: connection.kind.is_virtual(),
    }
}

impl From<InterfacePayload> for Interface {
    fn from(payload: InterfacePayload) -> Self {
        create_interface(payload)
    }
}

// ── Connection ─────────────────────────────────────────────────────

/// Build a Connection from a persisted backend payload.
pub fn create_connection(payload: ConnectionPayload) -> Connection {
    let kind = infer_kind(
        &payload.name,
        payload.kind.as_deref(),
        payload.bridge.is_some(),
        payload.bond.is_some(),
        payload.vlan.is_some(),
        false,
    );
    let start_mode = map_start_mode(&payload.name, payload.control.as_ref());
    let (used_by, mtu) = payload
        .link
        .map_or((None, None), |link| (link.master, link.mtu));

    Connection {
        id: id_or_generate(payload.id),
        kind,
        start_mode,
        mtu,
        ipv4: map_family(payload.ipv4),
        ipv6: map_family(payload.ipv6),
        used_by,
        bond: (kind == InterfaceKind::Bond).then(|| bond_options(payload.bond)),
        bridge: (kind == InterfaceKind::Bridge).then(|| bridge_options(payload.bridge)),
        vlan: if kind == InterfaceKind::Vlan {
            vlan_options(payload.vlan)
        } else {
            None
        },
        is_virtual: kind.is_virtual(),
        exists: true,
        name: payload.name,
    }
}

impl From<ConnectionPayload> for Connection {
    fn from(payload: ConnectionPayload) -> Self {
        create_connection(payload)
    }
}

/// Build a not-yet-persisted Connection from a UI request.
pub fn build_connection(request: NewConnection) -> Connection {
    let mut conn = Connection {
        id: EntityId::generate(),
        name: request.name,
        kind: request.kind,
        start_mode: request.start_mode,
        mtu: request.mtu,
        ipv4: sanitize_family(request.ipv4),
        ipv6: sanitize_family(request.ipv6),
        used_by: None,
        bond: request.bond,
        bridge: request.bridge,
        vlan: request.vlan,
        is_virtual: false,
        exists: false,
    };
    fit_kind_payloads(&mut conn);
    conn
}

/// Keep only the kind-specific payload matching `conn.kind`, defaulting
/// bond and bridge options when missing.
fn fit_kind_payloads(conn: &mut Connection) {
    let kind = conn.kind;
    if kind == InterfaceKind::Bond {
        conn.bond.get_or_insert_with(BondOptions::default);
    } else {
        conn.bond = None;
    }
    if kind == InterfaceKind::Bridge {
        conn.bridge.get_or_insert_with(BridgeOptions::default);
    } else {
        conn.bridge = None;
    }
    if kind != InterfaceKind::Vlan {
        conn.vlan = None;
    }
    conn.is_virtual = kind.is_virtual();
}

/// Stand-in connection for an interface that has no configuration.
pub fn placeholder_connection(interface: &Interface) -> Connection {
    Connection {
        id: EntityId::generate(),
        name: interface.name.clone(),
        kind: interface.kind,
        start_mode: StartMode::Off,
        mtu: None,
        ipv4: IpConfig::default(),
        ipv6: IpConfig::default(),
        used_by: None,
        bond: None,
        bridge: None,
        vlan: None,
        is_virtual: interface.kind.is_virtual(),
        exists: false,
    }
}

/// Apply a partial update on top of `current`.
///
/// Fields absent from `changes` keep their current value. The id never
/// changes. Kind-specific payloads and `is_virtual` follow the resulting
/// kind.
pub fn merge_connection(current: &Connection, changes: ConnectionChanges) -> Connection {
    let mut merged = current.clone();
    if let Some(name) = changes.name {
        merged.name = name;
    }
    if let Some(kind) = changes.kind {
        merged.kind = kind;
    }
    if let Some(start_mode) = changes.start_mode {
        merged.start_mode = start_mode;
    }
    if let Some(mtu) = changes.mtu {
        merged.mtu = Some(mtu);
    }
    if let Some(ipv4) = changes.ipv4 {
        merged.ipv4 = sanitize_family(ipv4);
    }
    if let Some(ipv6) = changes.ipv6 {
        merged.ipv6 = sanitize_family(ipv6);
    }
    if let Some(bond) = changes.bond {
        merged.bond = Some(bond);
    }
    if let Some(bridge) = changes.bridge {
        merged.bridge = Some(bridge);
    }
    if let Some(vlan) = changes.vlan {
        merged.vlan = Some(vlan);
    }
    fit_kind_payloads(&mut merged);
    merged
}

// ── Address ────────────────────────────────────────────────────────

pub fn create_address(draft: AddressDraft) -> Address {
    Address {
        id: draft.id.unwrap_or_else(EntityId::generate),
        local: draft.local.unwrap_or_default(),
        label: draft.label.unwrap_or_default(),
    }
}

/// Drop addresses without a local part and repeated `(local, label)`
/// pairs, keeping the first occurrence.
pub fn sanitize_addresses(addresses: Vec<Address>) -> Vec<Address> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|a| !a.local.trim().is_empty())
        .filter(|a| seen.insert((a.local.clone(), a.label.clone())))
        .collect()
}
