// ── Core error types ──
//
// User-facing errors from netcfg-core. Backend failures during a user
// operation are reported through the store as CONNECTION_ERROR; only
// programmer errors and failed validation come back as `Err`. The
// `From<BackendError>` impl translates backend failures into
// domain-appropriate variants where they do surface.

use std::fmt;

use thiserror::Error;

use crate::backend::BackendError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    #[error("Backend {operation} failed: {message}")]
    Backend { operation: String, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Connection not found: {identifier}")]
    ConnectionNotFound { identifier: String },

    #[error("Interface not found: {name}")]
    InterfaceNotFound { name: String },

    // ── Validation errors ────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn backend(operation: &str, err: &BackendError) -> Self {
        CoreError::Backend {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

// ── Conversion from backend errors ───────────────────────────────────

impl From<BackendError> for CoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound { name } => CoreError::InterfaceNotFound { name },
            BackendError::Io { ref path, .. } => CoreError::Backend {
                operation: format!("I/O on {}", path.display()),
                message: err.to_string(),
            },
            BackendError::Rejected { message } => CoreError::Backend {
                operation: "request".into(),
                message,
            },
            BackendError::Unavailable => CoreError::Backend {
                operation: "request".into(),
                message: "backend unavailable".into(),
            },
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// Every problem found while validating a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
