//! sysconfig backend for netcfg.
//!
//! [`SysconfigBackend`] implements [`netcfg_core::Backend`] on top of the
//! files under `/etc/sysconfig/network`:
//!
//! - `ifcfg-<name>` holds one connection, written through
//!   `netcfg_core::codec` and parsed back into a connection payload.
//! - `routes` holds device-less routes, `ifroute-<name>` the routes of one
//!   device.
//!
//! Interfaces come from sysfs (`/sys/class/net`). Configured virtual
//! devices that do not exist yet are reported as well, so their
//! connections keep an interface to hang off. [`spawn_poller`] watches
//! sysfs for link changes.
//!
//! Bringing interfaces up or down is left to the system's network service.

mod backend;
mod files;
pub mod ifcfg_payload;
mod options;
mod poller;
pub mod sysfs;

pub use backend::SysconfigBackend;
pub use options::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SYSCONFIG_DIR, DEFAULT_SYSFS_DIR, SysconfigOptions,
};
pub use poller::spawn_poller;
