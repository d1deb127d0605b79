use std::path::PathBuf;
use std::time::Duration;

/// Default location of `ifcfg-*`, `ifroute-*` and `routes`.
pub const DEFAULT_SYSCONFIG_DIR: &str = "/etc/sysconfig/network";

/// Default sysfs network class directory.
pub const DEFAULT_SYSFS_DIR: &str = "/sys/class/net";

/// Default interval between sysfs polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where the backend reads and writes, and how often it polls link state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysconfigOptions {
    pub sysconfig_dir: PathBuf,
    pub sysfs_dir: PathBuf,
    /// `None` disables the poller.
    pub poll_interval: Option<Duration>,
}

impl SysconfigOptions {
    /// Options rooted at custom directories, with the default poll interval.
    pub fn new(sysconfig_dir: impl Into<PathBuf>, sysfs_dir: impl Into<PathBuf>) -> Self {
        Self {
            sysconfig_dir: sysconfig_dir.into(),
            sysfs_dir: sysfs_dir.into(),
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval.filter(|d| !d.is_zero());
        self
    }

    pub(crate) fn ifcfg_path(&self, name: &str) -> PathBuf {
        self.sysconfig_dir.join(format!("{IFCFG_PREFIX}{name}"))
    }

    pub(crate) fn ifroute_path(&self, name: &str) -> PathBuf {
        self.sysconfig_dir.join(format!("{IFROUTE_PREFIX}{name}"))
    }

    pub(crate) fn routes_path(&self) -> PathBuf {
        self.sysconfig_dir.join(ROUTES_FILE)
    }
}

impl Default for SysconfigOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SYSCONFIG_DIR, DEFAULT_SYSFS_DIR)
    }
}

pub(crate) const IFCFG_PREFIX: &str = "ifcfg-";
pub(crate) const IFROUTE_PREFIX: &str = "ifroute-";
pub(crate) const ROUTES_FILE: &str = "routes";
