// ── Configuration backend contract ──
//
// The external service that persists connections and activates
// interfaces. The coordinator only talks to it through this trait, so
// tests can swap in a scripted double.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::{Connection, Route};
use crate::payload::{ConnectionPayload, InterfacePayload};

/// Failures reported by a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no such interface or connection: {name}")]
    NotFound { name: String },

    #[error("rejected: {message}")]
    Rejected { message: String },

    #[error("backend unavailable")]
    Unavailable,
}

impl BackendError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Asynchronous network configuration service.
///
/// Discovery calls return raw payloads; `crate::convert` turns them into
/// model types. Mutating calls take model types and persist them in the
/// backend's own format.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Every interface currently present on the host.
    async fn interfaces(&self) -> Result<Vec<InterfacePayload>, BackendError>;

    /// Every persisted connection.
    async fn connections(&self) -> Result<Vec<ConnectionPayload>, BackendError>;

    /// Static routes, in file order.
    async fn routes(&self) -> Result<Vec<Route>, BackendError>;

    async fn add_connection(&self, connection: &Connection) -> Result<(), BackendError>;

    async fn update_connection(&self, connection: &Connection) -> Result<(), BackendError>;

    async fn remove_connection(&self, connection: &Connection) -> Result<(), BackendError>;

    /// Re-apply the persisted configuration of `name`.
    async fn reload_connection(&self, name: &str) -> Result<(), BackendError>;

    async fn set_up(&self, name: &str) -> Result<(), BackendError>;

    async fn set_down(&self, name: &str) -> Result<(), BackendError>;

    /// Replace the full set of static routes.
    async fn update_routes(&self, routes: &[Route]) -> Result<(), BackendError>;

    /// Subscribe to interface change notifications.
    fn interface_changes(&self) -> broadcast::Receiver<InterfacePayload>;
}
