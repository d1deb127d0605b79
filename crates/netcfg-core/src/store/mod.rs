// ── Reactive reconciliation store ──
//
// A single immutable snapshot replaced through a closed set of
// transitions, with push-based change notification.

mod action;
mod network_store;
pub mod reducer;
mod state_stream;

pub use action::Action;
pub use network_store::{ListenerId, NetworkStore};
pub use state_stream::StateStream;
