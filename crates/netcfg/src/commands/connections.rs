//! Connection command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use netcfg_core::convert::create_address;
use netcfg_core::{
    Address, AddressDraft, BondOptions, BootProtocol, BridgeOptions, Connection,
    ConnectionChanges, Coordinator, IpConfig, NewConnection, VlanOptions,
};

use crate::cli::{
    AddConnectionArgs, ConnectionsArgs, ConnectionsCommand, GlobalOpts, SetConnectionArgs,
};
use crate::error::CliError;
use crate::output;

use super::{check_outcome, find_connection};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Start")]
    start_mode: String,
    #[tabled(rename = "Boot")]
    boot: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
    #[tabled(rename = "Master")]
    master: String,
    #[tabled(rename = "Configured")]
    configured: String,
}

impl From<&Connection> for ConnectionRow {
    fn from(c: &Connection) -> Self {
        Self {
            name: c.name.clone(),
            kind: c.kind.to_string(),
            start_mode: c.start_mode.to_string(),
            boot: c.boot_protocol().to_string(),
            addresses: c
                .addresses()
                .map(|a| a.local.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            master: c.used_by.clone().unwrap_or_default(),
            configured: if c.exists { "yes" } else { "no" }.into(),
        }
    }
}

fn detail(c: &Connection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:       {}", c.name);
    let _ = writeln!(out, "ID:         {}", c.id);
    let _ = writeln!(out, "Type:       {}", c.kind);
    let _ = writeln!(out, "Start mode: {}", c.start_mode);
    let _ = writeln!(out, "Boot:       {}", c.boot_protocol());
    if let Some(mtu) = c.mtu {
        let _ = writeln!(out, "MTU:        {mtu}");
    }
    for address in c.addresses() {
        if address.label.is_empty() {
            let _ = writeln!(out, "Address:    {}", address.local);
        } else {
            let _ = writeln!(out, "Address:    {} ({})", address.local, address.label);
        }
    }
    if let Some(master) = &c.used_by {
        let _ = writeln!(out, "Master:     {master}");
    }
    if let Some(bridge) = &c.bridge {
        let _ = writeln!(out, "Ports:      {}", bridge.ports.join(" "));
    }
    if let Some(bond) = &c.bond {
        let _ = writeln!(out, "Bond mode:  {}", bond.mode);
        let _ = writeln!(out, "Slaves:     {}", bond.interfaces.join(" "));
    }
    if let Some(vlan) = &c.vlan {
        let _ = writeln!(out, "VLAN:       {} on {}", vlan.vlan_id, vlan.parent_device);
    }
    let _ = write!(out, "Configured: {}", if c.exists { "yes" } else { "no" });
    out
}

// ── Request building ────────────────────────────────────────────────

/// Static addresses split into IPv4 and IPv6.
fn split_addresses(raw: &[String]) -> (Vec<Address>, Vec<Address>) {
    raw.iter()
        .map(|local| create_address(AddressDraft::local(local.as_str())))
        .partition(|address| !address.local.contains(':'))
}

fn family(dhcp: bool, addresses: Vec<Address>) -> IpConfig {
    if dhcp {
        IpConfig {
            boot_proto: BootProtocol::Dhcp,
            addresses,
        }
    } else if addresses.is_empty() {
        IpConfig::default()
    } else {
        IpConfig::with_addresses(addresses)
    }
}

fn new_connection(args: AddConnectionArgs) -> NewConnection {
    let (ipv4, ipv6) = split_addresses(&args.addresses);
    let bond = (!args.slaves.is_empty() || args.bond_mode.is_some()).then(|| {
        let defaults = BondOptions::default();
        BondOptions {
            mode: args.bond_mode.unwrap_or(defaults.mode),
            interfaces: args.slaves,
            options: args.bond_options.unwrap_or_default(),
        }
    });
    let vlan = args.vlan_id.map(|vlan_id| VlanOptions {
        vlan_id,
        parent_device: args.vlan_parent.unwrap_or_default(),
    });

    NewConnection {
        start_mode: args.start_mode,
        mtu: args.mtu,
        ipv4: family(args.dhcp4, ipv4),
        ipv6: family(args.dhcp6, ipv6),
        bond,
        bridge: (!args.ports.is_empty()).then_some(BridgeOptions { ports: args.ports }),
        vlan,
        ..NewConnection::new(args.name, args.kind)
    }
}

fn changes(args: &SetConnectionArgs) -> ConnectionChanges {
    let mut changes = ConnectionChanges {
        start_mode: args.start_mode,
        mtu: args.mtu,
        ..ConnectionChanges::default()
    };
    if args.dhcp4 {
        changes.ipv4 = Some(IpConfig::dhcp());
    }
    if !args.addresses.is_empty() {
        let (ipv4, ipv6) = split_addresses(&args.addresses);
        changes.ipv4 = Some(family(false, ipv4));
        changes.ipv6 = Some(family(false, ipv6));
    }
    changes
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: ConnectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConnectionsCommand::List => {
            let state = coordinator.state();
            let connections: Vec<Connection> = state.connections().cloned().collect();
            let out = output::render_list(
                &global.output,
                &connections,
                |c| ConnectionRow::from(c),
                |c| c.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Get { name } => {
            let connection = find_connection(coordinator, &name)?;
            let out = output::render_single(&global.output, &connection, detail, |c| {
                c.name.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Add(args) => {
            let name = args.name.clone();
            let existing = coordinator.state().connection_by_name(&name).cloned();
            if existing.is_some_and(|c| c.exists) {
                return Err(CliError::Conflict {
                    resource_type: "connection".into(),
                    identifier: name,
                });
            }
            coordinator.add_connection(new_connection(args)).await?;
            check_outcome(coordinator, &name, "add connection")?;
            output::print_status(&format!("Connection '{name}' added"), global.quiet);
            Ok(())
        }

        ConnectionsCommand::Set(args) => {
            let connection = find_connection(coordinator, &args.name)?;
            coordinator
                .update_connection(&connection.id, changes(&args))
                .await?;
            check_outcome(coordinator, &args.name, "update connection")?;
            output::print_status(&format!("Connection '{}' updated", args.name), global.quiet);
            Ok(())
        }

        ConnectionsCommand::Delete { name } => {
            let connection = find_connection(coordinator, &name)?;
            if !connection.exists {
                return Err(CliError::NotFound {
                    resource_type: "connection".into(),
                    identifier: name,
                    list_command: "connections list".into(),
                });
            }
            coordinator.delete_connection(&connection.id).await?;
            check_outcome(coordinator, &name, "delete connection")?;
            output::print_status(&format!("Connection '{name}' deleted"), global.quiet);
            Ok(())
        }
    }
}

/// `up` / `down`.
pub async fn set_link(
    coordinator: &Coordinator,
    name: &str,
    up: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.set_interface_state(name, up).await?;
    let operation = if up { "bring up" } else { "take down" };
    check_outcome(coordinator, name, operation)?;
    let verb = if up { "up" } else { "down" };
    output::print_status(&format!("Requested '{name}' {verb}"), global.quiet);
    Ok(())
}
