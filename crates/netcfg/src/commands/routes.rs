//! Static route command handlers.

use tabled::Tabled;

use netcfg_core::{Coordinator, Route};

use crate::cli::{GlobalOpts, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Netmask")]
    netmask: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Options")]
    options: String,
}

impl From<&Route> for RouteRow {
    fn from(r: &Route) -> Self {
        let column = |c: Option<&str>| c.unwrap_or("-").to_owned();
        Self {
            destination: column(r.destination.as_deref()),
            gateway: column(r.gateway.as_deref()),
            netmask: column(r.netmask.as_deref()),
            device: column(r.device.as_deref()),
            options: r.options.clone().unwrap_or_default(),
        }
    }
}

fn on_device(route: &Route, device: Option<&str>) -> bool {
    device.is_none_or(|d| route.device.as_deref() == Some(d))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: RoutesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let current: Vec<Route> = coordinator.state().routes().cloned().collect();

    match args.command {
        RoutesCommand::List { device } => {
            let routes: Vec<Route> = current
                .into_iter()
                .filter(|r| on_device(r, device.as_deref()))
                .collect();
            let out = output::render_list(
                &global.output,
                &routes,
                |r| RouteRow::from(r),
                |r| r.destination.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Add {
            destination,
            gateway,
            netmask,
            device,
            options,
        } => {
            let route = Route {
                gateway,
                netmask,
                device,
                options,
                ..Route::new(destination.clone(), String::new())
            };
            let mut routes = current;
            routes.push(route);
            coordinator.update_routes(routes).await?;
            output::print_status(&format!("Route to {destination} added"), global.quiet);
            Ok(())
        }

        RoutesCommand::Delete {
            destination,
            device,
        } => {
            let before = current.len();
            let routes: Vec<Route> = current
                .into_iter()
                .filter(|r| {
                    !(r.destination.as_deref() == Some(destination.as_str())
                        && on_device(r, device.as_deref()))
                })
                .collect();
            if routes.len() == before {
                return Err(CliError::NotFound {
                    resource_type: "route".into(),
                    identifier: destination,
                    list_command: "routes list".into(),
                });
            }
            let removed = before - routes.len();
            coordinator.update_routes(routes).await?;
            output::print_status(
                &format!("Removed {removed} route(s) to {destination}"),
                global.quiet,
            );
            Ok(())
        }
    }
}
