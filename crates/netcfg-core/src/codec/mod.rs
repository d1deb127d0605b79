// ── Textual configuration formats ──
//
// Pure conversions between the model and on-disk text. Nothing here touches
// the filesystem; backends own the I/O.

pub mod ifcfg;
pub mod routes;

pub use ifcfg::{IfcfgMap, encode_interface_config, parse_ifcfg, render_ifcfg};
pub use routes::{decode_routes, encode_routes};
