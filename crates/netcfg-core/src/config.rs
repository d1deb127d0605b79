// ── Runtime coordinator configuration ──
//
// Describes how the coordinator behaves. Never touches disk: the CLI
// builds a `CoordinatorConfig` from its own config layer and hands it in.

/// Configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Reject invalid connections before they reach the store.
    pub validate: bool,
    /// Follow backend interface notifications after [`start`](crate::Coordinator::start).
    pub watch_interfaces: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            validate: true,
            watch_interfaces: true,
        }
    }
}
