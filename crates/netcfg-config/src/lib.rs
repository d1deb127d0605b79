//! Shared configuration for the netcfg binary and embedders.
//!
//! One flat TOML file, merged with `NETCFG_*` environment variables over
//! built-in defaults, and translated to [`netcfg_core::CoordinatorConfig`]
//! and [`netcfg_sysconfig::SysconfigOptions`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netcfg_core::CoordinatorConfig;
use netcfg_sysconfig::{DEFAULT_SYSCONFIG_DIR, DEFAULT_SYSFS_DIR, SysconfigOptions};

/// Prefix of environment overrides, e.g. `NETCFG_POLL_INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "NETCFG_";

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding `ifcfg-*`, `ifroute-*` and `routes`.
    #[serde(default = "default_sysconfig_dir")]
    pub sysconfig_dir: PathBuf,

    /// sysfs network class directory.
    #[serde(default = "default_sysfs_dir")]
    pub sysfs_dir: PathBuf,

    /// Seconds between link-state polls; 0 disables polling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Reject invalid connections before they are saved.
    #[serde(default = "default_validate")]
    pub validate: bool,

    /// Log filter used when neither `RUST_LOG` nor `-v` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysconfig_dir: default_sysconfig_dir(),
            sysfs_dir: default_sysfs_dir(),
            poll_interval_secs: default_poll_interval(),
            validate: default_validate(),
            log_level: None,
        }
    }
}

fn default_sysconfig_dir() -> PathBuf {
    DEFAULT_SYSCONFIG_DIR.into()
}
fn default_sysfs_dir() -> PathBuf {
    DEFAULT_SYSFS_DIR.into()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_validate() -> bool {
    true
}

impl Config {
    /// Reject values that cannot be used.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.sysconfig_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "sysconfig_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.sysfs_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "sysfs_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::Validation {
                    field: "log_level".into(),
                    reason: format!("expected one of {}, got '{level}'", LOG_LEVELS.join(", ")),
                });
            }
        }
        Ok(())
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            validate: self.validate,
            ..CoordinatorConfig::default()
        }
    }

    pub fn sysconfig_options(&self) -> SysconfigOptions {
        SysconfigOptions::new(&self.sysconfig_dir, &self.sysfs_dir)
            .with_poll_interval(Some(Duration::from_secs(self.poll_interval_secs)))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "netcfg", "netcfg").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netcfg");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file is fine.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX));

    let config: Config = figment.extract()?;
    config.check()?;
    Ok(config)
}

/// Load config, returning the defaults if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.check()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
