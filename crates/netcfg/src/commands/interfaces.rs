//! Interface listing.

use tabled::Tabled;

use netcfg_core::{Coordinator, Interface};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Driver")]
    driver: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Interface> for InterfaceRow {
    fn from(i: &Interface) -> Self {
        Self {
            name: i.name.clone(),
            kind: i.kind.to_string(),
            link: if i.link { "up" } else { "down" }.into(),
            mac: i.mac.as_ref().map(ToString::to_string).unwrap_or_default(),
            driver: i.driver.clone().unwrap_or_default(),
            status: match &i.error {
                Some(error) => format!("{}: {error}", i.status),
                None => i.status.to_string(),
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let state = coordinator.state();
    let interfaces: Vec<Interface> = state.interfaces().cloned().collect();
    let out = output::render_list(
        &global.output,
        &interfaces,
        |i| InterfaceRow::from(i),
        |i| i.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
