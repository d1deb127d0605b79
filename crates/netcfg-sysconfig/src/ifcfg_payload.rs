// ── ifcfg to payload ──
//
// Reads a parsed `ifcfg-<name>` key map back into the backend payload the
// core converts into a Connection. The inverse of
// `netcfg_core::codec::encode_interface_config`, plus a few keys written by
// other tools (`INTERFACETYPE`, `dhcp+autoip`, `onboot`).

use netcfg_core::BootProtocol;
use netcfg_core::codec::IfcfgMap;
use netcfg_core::payload::{
    AddressPayload, BondPayload, BridgePayload, ConnectionPayload, ControlPayload, DhcpPayload,
    FamilyPayload, LinkPayload, VlanPayload,
};
use tracing::warn;

/// Build the connection payload for `ifcfg-<name>`.
pub fn connection_payload(name: &str, map: &IfcfgMap) -> ConnectionPayload {
    let (dhcp4, dhcp6) = dhcp_families(name, get(map, "BOOTPROTO"));
    let (ipv4_addresses, ipv6_addresses) = addresses(map);

    ConnectionPayload {
        id: None,
        name: name.to_owned(),
        kind: get(map, "INTERFACETYPE").map(str::to_ascii_lowercase),
        control: Some(control(get(map, "STARTMODE"))),
        ipv4: Some(family(dhcp4, ipv4_addresses)),
        ipv6: Some(family(dhcp6, ipv6_addresses)),
        link: Some(LinkPayload {
            up: None,
            master: None,
            mtu: mtu(name, get(map, "MTU")),
        }),
        bond: bond(map),
        bridge: bridge(map),
        vlan: vlan(name, map),
        extra: serde_json::Map::new(),
    }
}

fn get<'a>(map: &'a IfcfgMap, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn is_yes(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("yes"))
}

// ── Addressing ─────────────────────────────────────────────────────

fn dhcp_families(name: &str, bootproto: Option<&str>) -> (bool, bool) {
    let Some(raw) = bootproto else {
        return (false, false);
    };
    // `dhcp+autoip` and friends: the DHCP part is what we model.
    let base = raw.split('+').next().unwrap_or(raw);
    match base.parse::<BootProtocol>() {
        Ok(proto) => {
            let (v4, v6) = proto.split();
            (v4.is_dhcp(), v6.is_dhcp())
        }
        Err(_) if base.eq_ignore_ascii_case("autoip") => (false, false),
        Err(_) => {
            warn!(connection = name, bootproto = raw, "unknown BOOTPROTO, ignoring");
            (false, false)
        }
    }
}

/// `IPADDR<suffix>` entries in file order, split by family. The label
/// comes from the matching `LABEL<suffix>`.
fn addresses(map: &IfcfgMap) -> (Vec<AddressPayload>, Vec<AddressPayload>) {
    let mut ipv4 = Vec::new();
    let mut ipv6 = Vec::new();
    for (key, value) in map {
        let Some(suffix) = key.strip_prefix("IPADDR") else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let address = AddressPayload {
            id: None,
            local: value.clone(),
            label: map.get(&format!("LABEL{suffix}")).cloned().unwrap_or_default(),
        };
        if value.contains(':') {
            ipv6.push(address);
        } else {
            ipv4.push(address);
        }
    }
    (ipv4, ipv6)
}

fn family(dhcp: bool, addresses: Vec<AddressPayload>) -> FamilyPayload {
    FamilyPayload {
        dhcp: dhcp.then(DhcpPayload::default),
        static_addresses: addresses,
    }
}

// ── Link ───────────────────────────────────────────────────────────

fn control(startmode: Option<&str>) -> ControlPayload {
    let Some(mode) = startmode.map(str::to_ascii_lowercase) else {
        return ControlPayload::default();
    };
    match mode.as_str() {
        "auto" | "boot" | "onboot" => ControlPayload {
            mode: Some("boot".into()),
            ..ControlPayload::default()
        },
        "nfsroot" => ControlPayload {
            mode: Some("boot".into()),
            boot_stage: Some("localfs".into()),
            persistent: true,
        },
        _ => ControlPayload {
            mode: Some(mode),
            ..ControlPayload::default()
        },
    }
}

fn mtu(name: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    match raw.parse::<u32>() {
        Ok(0) => None,
        Ok(mtu) => Some(mtu),
        Err(_) => {
            warn!(connection = name, mtu = raw, "invalid MTU, ignoring");
            None
        }
    }
}

// ── Virtual devices ────────────────────────────────────────────────

fn bridge(map: &IfcfgMap) -> Option<BridgePayload> {
    is_yes(get(map, "BRIDGE")).then(|| BridgePayload {
        ports: get(map, "BRIDGE_PORTS")
            .map(|p| p.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default(),
    })
}

fn bond(map: &IfcfgMap) -> Option<BondPayload> {
    if !is_yes(get(map, "BONDING_MASTER")) {
        return None;
    }
    let mut mode = None;
    let mut options = Vec::new();
    for token in get(map, "BONDING_MODULE_OPTS")
        .unwrap_or_default()
        .split_whitespace()
    {
        match token.strip_prefix("mode=") {
            Some(m) => mode = Some(m.to_owned()),
            None => options.push(token),
        }
    }
    let slaves = map
        .iter()
        .filter(|(key, value)| key.starts_with("BONDING_SLAVE") && !value.is_empty())
        .map(|(_, value)| value.clone())
        .collect();
    Some(BondPayload {
        mode,
        slaves,
        options: (!options.is_empty()).then(|| options.join(" ")),
    })
}

fn vlan(name: &str, map: &IfcfgMap) -> Option<VlanPayload> {
    let device = get(map, "ETHERDEVICE")?;
    // Without VLAN_ID the tag is the numeric suffix of `<parent>.<tag>`.
    let tag = get(map, "VLAN_ID")
        .or_else(|| name.rsplit_once('.').map(|(_, tag)| tag))
        .and_then(|t| t.parse::<u16>().ok());
    Some(VlanPayload {
        tag,
        device: Some(device.to_owned()),
    })
}
