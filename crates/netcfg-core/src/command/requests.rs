// ── Typed request structs for Command payloads ──
//
// What a UI hands the coordinator. The model factory turns these into
// canonical Connections and Addresses.

use serde::{Deserialize, Serialize};

use crate::model::{
    BondOptions, BridgeOptions, EntityId, InterfaceKind, IpConfig, StartMode, VlanOptions,
};

// ── Connection ─────────────────────────────────────────────────────

/// A connection the user wants to create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewConnection {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: InterfaceKind,
    #[serde(default)]
    pub start_mode: StartMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub ipv4: IpConfig,
    #[serde(default)]
    pub ipv6: IpConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bond: Option<BondOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanOptions>,
}

impl NewConnection {
    pub fn new(name: impl Into<String>, kind: InterfaceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }
}

/// Partial update of a connection. `None` fields keep their current
/// value; `ipv4` / `ipv6` replace the whole family when given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<InterfaceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_mode: Option<StartMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bond: Option<BondOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanOptions>,
}

// ── Address ────────────────────────────────────────────────────────

/// Raw address fields from a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AddressDraft {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            local: Some(local.into()),
            ..Self::default()
        }
    }
}
