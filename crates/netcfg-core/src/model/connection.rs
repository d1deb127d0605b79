// ── Connection domain types ──
//
// A Connection is the backend-agnostic description of how one interface
// should be configured. It is matched to its Interface by name.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::entity_id::EntityId;
use super::interface::InterfaceKind;

/// Default bonding mode when a bond is configured without one.
pub const DEFAULT_BOND_MODE: &str = "active-backup";

/// When an interface is brought up.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StartMode {
    #[default]
    Off,
    Auto,
    Hotplug,
    Ifplugd,
    Manual,
    Nfsroot,
}

/// Address assignment method.
///
/// Per IP family only `Dhcp`, `Static` and `None` are meaningful. The split
/// `Dhcp4` / `Dhcp6` values only appear once both families are folded into
/// a single `BOOTPROTO` (see [`BootProtocol::combine`]).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BootProtocol {
    Dhcp,
    Dhcp4,
    Dhcp6,
    Static,
    #[default]
    None,
}

impl BootProtocol {
    pub fn is_dhcp(self) -> bool {
        matches!(self, Self::Dhcp | Self::Dhcp4 | Self::Dhcp6)
    }

    /// Fold the two per-family settings into one protocol.
    ///
    /// `dhcp` when both families use DHCP, `dhcp4`/`dhcp6` when only one
    /// does, otherwise `static` when any family is static or carries an
    /// address, otherwise `none`.
    pub fn combine(ipv4: &IpConfig, ipv6: &IpConfig) -> Self {
        match (ipv4.boot_proto.is_dhcp(), ipv6.boot_proto.is_dhcp()) {
            (true, true) => Self::Dhcp,
            (true, false) => Self::Dhcp4,
            (false, true) => Self::Dhcp6,
            (false, false) if ipv4.is_static() || ipv6.is_static() => Self::Static,
            (false, false) => Self::None,
        }
    }

    /// Inverse of [`combine`](Self::combine): per-family protocols
    /// implied by a combined value.
    pub fn split(self) -> (Self, Self) {
        match self {
            Self::Dhcp => (Self::Dhcp, Self::Dhcp),
            Self::Dhcp4 => (Self::Dhcp, Self::None),
            Self::Dhcp6 => (Self::None, Self::Dhcp),
            Self::Static => (Self::Static, Self::Static),
            Self::None => (Self::None, Self::None),
        }
    }
}

/// One configured address. `local` is an IP or CIDR string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: EntityId,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub label: String,
}

/// Settings of one IP family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(default)]
    pub boot_proto: BootProtocol,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl IpConfig {
    pub fn dhcp() -> Self {
        Self {
            boot_proto: BootProtocol::Dhcp,
            addresses: Vec::new(),
        }
    }

    pub fn with_addresses(addresses: Vec<Address>) -> Self {
        Self {
            boot_proto: BootProtocol::Static,
            addresses,
        }
    }

    fn is_static(&self) -> bool {
        self.boot_proto == BootProtocol::Static || !self.addresses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondOptions {
    #[serde(default = "default_bond_mode")]
    pub mode: String,
    /// Enslaved interface names, in order.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Extra module options, e.g. `miimon=100`.
    #[serde(default)]
    pub options: String,
}

impl Default for BondOptions {
    fn default() -> Self {
        Self {
            mode: default_bond_mode(),
            interfaces: Vec::new(),
            options: String::new(),
        }
    }
}

fn default_bond_mode() -> String {
    DEFAULT_BOND_MODE.into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOptions {
    #[serde(default)]
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanOptions {
    pub vlan_id: u16,
    pub parent_device: String,
}

/// The canonical Connection type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: EntityId,
    /// Must match an interface name to take effect.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    #[serde(default)]
    pub start_mode: StartMode,
    pub mtu: Option<u32>,
    #[serde(default)]
    pub ipv4: IpConfig,
    #[serde(default)]
    pub ipv6: IpConfig,
    /// Master interface this one is enslaved to (lookup only).
    pub used_by: Option<String>,

    // Kind-specific payloads; only the one matching `kind` is ever set.
    pub bond: Option<BondOptions>,
    pub bridge: Option<BridgeOptions>,
    pub vlan: Option<VlanOptions>,

    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    /// Whether a backend-persisted connection exists for this name.
    /// `false` marks a placeholder for an unconfigured interface.
    #[serde(default)]
    pub exists: bool,
}

impl Connection {
    /// Combined boot protocol of both families (the `BOOTPROTO` value).
    pub fn boot_protocol(&self) -> BootProtocol {
        BootProtocol::combine(&self.ipv4, &self.ipv6)
    }

    /// IPv4 addresses followed by IPv6 addresses.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.ipv4.addresses.iter().chain(self.ipv6.addresses.iter())
    }

    pub fn is_placeholder(&self) -> bool {
        !self.exists
    }
}
