// ── Store transitions ──

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::model::{Connection, Interface, Route};

/// The closed set of transitions the store accepts.
///
/// Serialized adjacently tagged (`{"type": "ADD_CONNECTION", "payload":
/// {...}}`). Tags this version does not know deserialize to
/// [`Action::Unknown`], which never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Full interface resync. Status and errors are reset.
    SetInterfaces(Vec<Interface>),
    SetConnections(Vec<Connection>),
    SetRoutes(Vec<Route>),
    AddConnection(Connection),
    UpdateConnection(Connection),
    DeleteConnection(Connection),
    /// Discovery update for one interface, matched by name.
    UpdateInterface(Interface),
    ConnectionError {
        connection: Connection,
        error: String,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Transition tag, e.g. `"ADD_CONNECTION"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
