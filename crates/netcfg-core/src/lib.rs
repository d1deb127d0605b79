//! Connection model, config translation and optimistic state reconciliation
//! for host network configuration.
//!
//! This crate owns the domain model and the reactive state layer between a
//! configuration backend and UI consumers (CLI / GUI):
//!
//! - **[`Coordinator`]**: Entry point for user-initiated changes. Every
//!   operation dispatches an optimistic transition to the store, then calls
//!   the injected [`Backend`] and reconciles the result. Operations on the
//!   same connection name queue behind each other.
//!
//! - **[`NetworkStore`]**: Single immutable [`NetworkState`] snapshot
//!   replaced through the closed [`Action`] set. Synchronous listeners via
//!   [`subscribe`](NetworkStore::subscribe), async ones via
//!   [`watch`](NetworkStore::watch).
//!
//! - **[`codec`]**: `ifcfg-*` and route file text: ordered ifcfg key maps
//!   with the flat IPv4-then-IPv6 address numbering, and the columnar route
//!   format with `-` placeholders.
//!
//! - **[`convert`]**: Model factory: backend payloads and UI requests to
//!   canonical types, with kind and start-mode inference.
//!
//! - **Domain model** ([`model`]): `Interface`, `Connection`, `Route` and
//!   friends, identified by [`EntityId`].

pub mod backend;
pub mod codec;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod payload;
pub mod store;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, BackendError};
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{CoreError, ValidationErrors};
pub use store::{Action, ListenerId, NetworkStore, StateStream};
pub use validate::validate_connection;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Address, BondOptions, BootProtocol, BridgeOptions, Connection, EntityId, Interface,
    InterfaceKind, InterfaceStatus, IpConfig, MacAddress, NetworkState, Route, StartMode,
    VlanOptions,
};
