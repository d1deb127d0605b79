// ── Interface domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::entity_id::{EntityId, MacAddress};

/// Link-layer kind of an interface or connection.
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
pub enum InterfaceKind {
    #[default]
    Ethernet,
    Wireless,
    Bridge,
    Bond,
    Vlan,
    Dummy,
    Loopback,
}

impl InterfaceKind {
    /// Virtual kinds have no physical device: they exist only while a
    /// connection of that kind does.
    pub fn is_virtual(self) -> bool {
        matches!(self, Self::Bridge | Self::Bond | Self::Vlan | Self::Dummy)
    }
}

/// Reconciliation status of an interface.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InterfaceStatus {
    /// No change in flight.
    #[default]
    Idle,
    /// An optimistic change is waiting for backend confirmation.
    InProgress,
    /// The last backend call failed; see [`Interface::error`].
    Error,
}

/// A discovered network device and its observed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    pub mac: Option<MacAddress>,
    pub driver: Option<String>,
    /// `true` when the link is up.
    #[serde(default)]
    pub link: bool,
    #[serde(default)]
    pub status: InterfaceStatus,
    pub error: Option<String>,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
}

impl Interface {
    /// Whether a change is currently in flight. UIs disable the controls
    /// that would start another one.
    pub fn is_busy(&self) -> bool {
        self.status == InterfaceStatus::InProgress
    }

    pub fn has_error(&self) -> bool {
        self.status == InterfaceStatus::Error
    }
}
