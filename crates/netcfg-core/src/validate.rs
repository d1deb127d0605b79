// ── Connection validation ──
//
// Checks a connection before it is dispatched. Collects every problem
// instead of stopping at the first one.

use std::collections::HashSet;
use std::net::IpAddr;

use crate::error::ValidationErrors;
use crate::model::{Address, BootProtocol, Connection, InterfaceKind};

const VLAN_ID_RANGE: std::ops::RangeInclusive<u16> = 1..=4094;

/// Validate a connection.
pub fn validate_connection(conn: &Connection) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if conn.name.trim().is_empty() {
        errors.push("connection name must not be empty");
    }

    for (family, config) in [("IPv4", &conn.ipv4), ("IPv6", &conn.ipv6)] {
        if config.boot_proto == BootProtocol::Static && config.addresses.is_empty() {
            errors.push(format!("{family}: static configuration needs an address"));
        }
        for address in &config.addresses {
            if let Err(message) = check_address(address) {
                errors.push(format!("{family}: {message}"));
            }
        }
    }

    let mut labels = HashSet::new();
    for address in conn.addresses() {
        if !address.label.is_empty() && !labels.insert(address.label.as_str()) {
            errors.push(format!("duplicate address label '{}'", address.label));
        }
    }

    if conn.kind == InterfaceKind::Vlan {
        match &conn.vlan {
            Some(vlan) if !VLAN_ID_RANGE.contains(&vlan.vlan_id) => {
                errors.push(format!("VLAN id {} is outside 1-4094", vlan.vlan_id));
            }
            Some(vlan) if vlan.parent_device.trim().is_empty() => {
                errors.push("VLAN needs a parent device");
            }
            Some(_) => {}
            None => errors.push("VLAN connection has no VLAN settings"),
        }
    }

    errors.into_result()
}

/// Accepts `addr` or `addr/prefix` with a prefix valid for the family.
fn check_address(address: &Address) -> Result<(), String> {
    let local = address.local.trim();
    let (ip, prefix) = match local.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (local, None),
    };
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| format!("'{local}' is not a valid IP address"))?;
    if let Some(prefix) = prefix {
        let max = if ip.is_ipv4() { 32 } else { 128 };
        match prefix.parse::<u8>() {
            Ok(len) if len <= max => {}
            _ => return Err(format!("'{local}' has an invalid prefix length")),
        }
    }
    Ok(())
}
