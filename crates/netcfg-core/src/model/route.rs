// ── Static route domain type ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// One static route. Every column is optional; an absent column is
/// written as `-` in route files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: EntityId,
    pub destination: Option<String>,
    pub gateway: Option<String>,
    pub netmask: Option<String>,
    pub device: Option<String>,
    pub options: Option<String>,
}

impl Route {
    pub fn new(destination: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            destination: Some(destination.into()),
            gateway: Some(gateway.into()),
            netmask: None,
            device: None,
            options: None,
        }
    }

    /// The five positional columns: destination, gateway, netmask, device,
    /// options. Ignores the id, so it doubles as a content comparison key.
    pub fn columns(&self) -> [Option<&str>; 5] {
        [
            self.destination.as_deref(),
            self.gateway.as_deref(),
            self.netmask.as_deref(),
            self.device.as_deref(),
            self.options.as_deref(),
        ]
    }

    /// Same route content, regardless of id.
    pub fn same_as(&self, other: &Self) -> bool {
        self.columns() == other.columns()
    }
}
