//! `render`: file text exactly as the backend would write it.

use netcfg_core::Coordinator;
use netcfg_core::codec::{encode_interface_config, encode_routes, render_ifcfg};

use crate::cli::{RenderArgs, RenderCommand};
use crate::error::CliError;
use crate::output;

use super::find_connection;

pub fn handle(coordinator: &Coordinator, args: RenderArgs) -> Result<(), CliError> {
    match args.command {
        RenderCommand::Connection { name } => {
            let connection = find_connection(coordinator, &name)?;
            output::print_raw(&render_ifcfg(&encode_interface_config(&connection)));
            Ok(())
        }

        RenderCommand::Routes { device } => {
            let state = coordinator.state();
            let routes: Vec<_> = state
                .routes()
                .filter(|r| r.device == device)
                .cloned()
                .collect();
            output::print_raw(&encode_routes(&routes));
            Ok(())
        }
    }
}
