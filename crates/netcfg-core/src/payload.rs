// Backend discovery payloads
//
// Raw shapes a backend reports for interfaces and connections. Fields use
// `#[serde(default)]` liberally because backends differ in what they fill
// in; `crate::convert` turns these into the canonical model, applying the
// defaulting and inference rules in one place.

use serde::{Deserialize, Serialize};

// ── Interface ───────────────────────────────────────────────────────

/// A discovered device, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfacePayload {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Explicit kind hint (e.g. `"ethernet"`), used when no sub-payload
    /// identifies the kind.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Hardware info; carries the MAC address.
    #[serde(default)]
    pub ethernet: Option<HardwarePayload>,
    #[serde(default)]
    pub driver_info: Option<DriverPayload>,
    #[serde(default)]
    pub link: Option<LinkPayload>,
    #[serde(default)]
    pub bridge: Option<BridgePayload>,
    #[serde(default)]
    pub bond: Option<BondPayload>,
    #[serde(default)]
    pub vlan: Option<VlanPayload>,
    #[serde(default)]
    pub wireless: Option<serde_json::Value>,
    /// Catch-all for fields we do not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwarePayload {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPayload {
    #[serde(default)]
    pub driver: Option<String>,
}

/// Link-level settings, shared by interface and connection payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPayload {
    #[serde(default)]
    pub up: Option<bool>,
    #[serde(default)]
    pub master: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
}

// ── Connection ──────────────────────────────────────────────────────

/// A persisted connection, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub control: Option<ControlPayload>,
    #[serde(default)]
    pub ipv4: Option<FamilyPayload>,
    #[serde(default)]
    pub ipv6: Option<FamilyPayload>,
    #[serde(default)]
    pub link: Option<LinkPayload>,
    #[serde(default)]
    pub bond: Option<BondPayload>,
    #[serde(default)]
    pub bridge: Option<BridgePayload>,
    #[serde(default)]
    pub vlan: Option<VlanPayload>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Start control: `mode` is one of `boot`, `hotplug`, `ifplugd`, `manual`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub boot_stage: Option<String>,
    #[serde(default)]
    pub persistent: bool,
}

/// Per-family addressing as the backend stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPayload {
    #[serde(default)]
    pub dhcp: Option<DhcpPayload>,
    #[serde(default, rename = "static")]
    pub static_addresses: Vec<AddressPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpPayload {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for DhcpPayload {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondPayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub slaves: Vec<String>,
    #[serde(default)]
    pub options: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePayload {
    #[serde(default)]
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanPayload {
    #[serde(default)]
    pub tag: Option<u16>,
    #[serde(default)]
    pub device: Option<String>,
}
