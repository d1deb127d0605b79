// ── Unified domain model ──
//
// Canonical, backend-agnostic representation of host network
// configuration. Backend payloads are converted into these types by
// `crate::convert`; the store and UI consumers only ever see these.

pub mod connection;
pub mod entity_id;
pub mod interface;
pub mod route;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use netcfg_core::model::*` gives you everything.

pub use connection::{
    Address, BondOptions, BootProtocol, BridgeOptions, Connection, DEFAULT_BOND_MODE, IpConfig,
    StartMode, VlanOptions,
};
pub use entity_id::{EntityId, MacAddress};
pub use interface::{Interface, InterfaceKind, InterfaceStatus};
pub use route::Route;
pub use state::NetworkState;
