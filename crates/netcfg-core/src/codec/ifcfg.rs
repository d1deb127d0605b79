// ── ifcfg key/value codec ──
//
// `ifcfg-<name>` files are flat shell-style assignments. Encoding builds an
// ordered map from a Connection; rendering and parsing convert that map to
// and from file text.

use indexmap::IndexMap;
use tracing::debug;

use crate::model::{Address, Connection, InterfaceKind};

/// Ordered ifcfg keys and values. Order is the order keys were inserted,
/// which is the order they are written.
pub type IfcfgMap = IndexMap<String, String>;

/// Build the ifcfg key set for a connection.
///
/// Keys appear in a fixed order: `BOOTPROTO`, `STARTMODE`, `MTU`, the
/// numbered address keys, then the bridge, bond or vlan block. Dummy
/// devices, which have no block of their own, get `INTERFACETYPE`. Keys
/// whose value is undefined are left out.
pub fn encode_interface_config(conn: &Connection) -> IfcfgMap {
    let mut map = IfcfgMap::new();

    map.insert("BOOTPROTO".into(), conn.boot_protocol().to_string());
    map.insert("STARTMODE".into(), conn.start_mode.to_string());
    if let Some(mtu) = conn.mtu {
        map.insert("MTU".into(), mtu.to_string());
    }

    // IPv6 numbering continues after the IPv4 addresses.
    let ipv4 = &conn.ipv4.addresses;
    let ipv6 = &conn.ipv6.addresses;
    insert_addresses(&mut map, ipv4, 0);
    insert_addresses(&mut map, ipv6, ipv4.len());

    if let Some(bridge) = &conn.bridge {
        map.insert("BRIDGE".into(), "yes".into());
        map.insert("BRIDGE_PORTS".into(), bridge.ports.join(" "));
    }

    if let Some(bond) = &conn.bond {
        map.insert("BONDING_MASTER".into(), "yes".into());
        let module_opts = if bond.options.trim().is_empty() {
            format!("mode={}", bond.mode)
        } else {
            format!("mode={} {}", bond.mode, bond.options.trim())
        };
        map.insert("BONDING_MODULE_OPTS".into(), module_opts);
        for (index, slave) in bond.interfaces.iter().enumerate() {
            map.insert(format!("BONDING_SLAVE_{index}"), slave.clone());
        }
    }

    if let Some(vlan) = &conn.vlan {
        map.insert("ETHERDEVICE".into(), vlan.parent_device.clone());
        map.insert("VLAN_ID".into(), vlan.vlan_id.to_string());
    }

    if conn.kind == InterfaceKind::Dummy {
        map.insert("INTERFACETYPE".into(), conn.kind.to_string());
    }

    map
}

fn insert_addresses(map: &mut IfcfgMap, addresses: &[Address], offset: usize) {
    for (position, address) in addresses.iter().enumerate() {
        let suffix = numbered_suffix(offset + position);
        map.insert(format!("IPADDR{suffix}"), address.local.clone());
        if !address.label.is_empty() {
            map.insert(format!("LABEL{suffix}"), address.label.clone());
        }
    }
}

/// `""` for index 0, `_N` afterwards.
fn numbered_suffix(index: usize) -> String {
    if index == 0 {
        String::new()
    } else {
        format!("_{index}")
    }
}

// ── Text ────────────────────────────────────────────────────────────

/// Render a key map as `KEY="VALUE"` lines, one per key, in map order.
pub fn render_ifcfg(map: &IfcfgMap) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push_str("\"\n");
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parse ifcfg file text into a key map.
///
/// Accepts unquoted, single-quoted and double-quoted values. Comments,
/// blank lines and lines without a valid `KEY=` prefix are ignored. A key
/// assigned twice keeps its first position and its last value.
pub fn parse_ifcfg(text: &str) -> IfcfgMap {
    let mut map = IfcfgMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!(line = index + 1, "ignoring ifcfg line without assignment");
            continue;
        };
        let key = key.trim();
        if !is_valid_key(key) {
            debug!(line = index + 1, key, "ignoring ifcfg line with invalid key");
            continue;
        }
        map.insert(key.to_owned(), unquote(value.trim()));
    }
    map
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unquote(value: &str) -> String {
    if let Some(inner) = strip_pair(value, '\'') {
        return inner.to_owned();
    }
    if let Some(inner) = strip_pair(value, '"') {
        return unescape(inner);
    }
    value.to_owned()
}

fn strip_pair(value: &str, quote: char) -> Option<&str> {
    value
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '"' | '$' | '`') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}
