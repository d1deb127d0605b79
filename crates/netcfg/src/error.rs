//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netcfg_config::ConfigError;
use netcfg_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const BACKEND: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netcfg::not_found),
        help("Run: netcfg {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(
        code(netcfg::conflict),
        help("Change it with: netcfg connections set {identifier}")
    )]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netcfg::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid connection: {messages}")]
    #[diagnostic(
        code(netcfg::invalid_connection),
        help("Fix the listed fields, or pass --no-validate to write it anyway.")
    )]
    InvalidConnection { messages: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("Failed to {operation}: {message}")]
    #[diagnostic(
        code(netcfg::backend),
        help("Check that {path} is writable (try running as root).")
    )]
    Backend {
        operation: String,
        message: String,
        path: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(netcfg::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(netcfg::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render TOML: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::InvalidConnection { .. } => exit_code::USAGE,
            Self::Backend { .. } | Self::Io(_) => exit_code::BACKEND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionNotFound { identifier } => CliError::NotFound {
                resource_type: "connection".into(),
                identifier,
                list_command: "connections list".into(),
            },

            CoreError::InterfaceNotFound { name } => CliError::NotFound {
                resource_type: "interface".into(),
                identifier: name,
                list_command: "interfaces".into(),
            },

            CoreError::Validation(errors) => CliError::InvalidConnection {
                messages: errors.to_string(),
            },

            CoreError::Backend { operation, message } => CliError::Backend {
                operation,
                message,
                path: "the sysconfig directory".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
