// ── Command API ──
//
// All user-initiated write operations flow through a unified `Command`
// enum. The coordinator routes each variant to its entry point.

pub mod requests;

use crate::model::{Connection, EntityId, Route};

pub use requests::{AddressDraft, ConnectionChanges, NewConnection};

/// All possible write operations against the network configuration.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Connection CRUD ──────────────────────────────────────────────
    AddConnection(NewConnection),
    UpdateConnection {
        id: EntityId,
        changes: ConnectionChanges,
    },
    DeleteConnection {
        id: EntityId,
    },

    // ── Interface operations ─────────────────────────────────────────
    SetInterfaceState {
        name: String,
        up: bool,
    },

    // ── Routes ───────────────────────────────────────────────────────
    UpdateRoutes(Vec<Route>),

    // ── Discovery ────────────────────────────────────────────────────
    Refresh,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    /// The connection the operation was attempted on.
    Connection(Connection),
    Routes(Vec<Route>),
}
