//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod connections;
pub mod interfaces;
pub mod render;
pub mod routes;

use std::sync::Arc;

use netcfg_config::Config;
use netcfg_core::{Connection, Coordinator};
use netcfg_sysconfig::SysconfigBackend;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Load the config file named by `--config` (or the default one) and apply
/// the directory and validation flags on top.
pub fn load_settings(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut settings = match &global.config {
        Some(path) => netcfg_config::load_config_from(path)?,
        None => netcfg_config::load_config()?,
    };
    if let Some(dir) = &global.sysconfig_dir {
        settings.sysconfig_dir.clone_from(dir);
    }
    if let Some(dir) = &global.sysfs_dir {
        settings.sysfs_dir.clone_from(dir);
    }
    if global.no_validate {
        settings.validate = false;
    }
    Ok(settings)
}

/// Build a coordinator over the sysconfig backend and load current state.
///
/// One-shot commands never start the poller.
pub async fn connect(settings: &Config) -> Result<Coordinator, CliError> {
    let options = settings.sysconfig_options().with_poll_interval(None);
    let backend = Arc::new(SysconfigBackend::new(options));
    let coordinator = Coordinator::new(backend, settings.coordinator_config());
    coordinator.refresh().await?;
    Ok(coordinator)
}

/// Dispatch a state-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Interfaces => interfaces::handle(coordinator, global),
        Command::Connections(args) => connections::handle(coordinator, args, global).await,
        Command::Up { name } => connections::set_link(coordinator, &name, true, global).await,
        Command::Down { name } => connections::set_link(coordinator, &name, false, global).await,
        Command::Routes(args) => routes::handle(coordinator, args, global).await,
        Command::Render(args) => render::handle(coordinator, args),
        Command::Config(args) => config_cmd::handle(args, global),
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Look up a connection (or placeholder) by name.
pub fn find_connection(coordinator: &Coordinator, name: &str) -> Result<Connection, CliError> {
    coordinator
        .state()
        .connection_by_name(name)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "connection".into(),
            identifier: name.into(),
            list_command: "connections list".into(),
        })
}

/// Coordinator operations report backend failures on the interface rather
/// than returning them; surface that as an error.
pub fn check_outcome(coordinator: &Coordinator, name: &str, operation: &str) -> Result<(), CliError> {
    let state = coordinator.state();
    let failure = state
        .interface_by_name(name)
        .filter(|iface| iface.has_error())
        .and_then(|iface| iface.error.clone());
    match failure {
        Some(message) => Err(CliError::Backend {
            operation: operation.into(),
            message,
            path: "the sysconfig directory".into(),
        }),
        None => Ok(()),
    }
}
