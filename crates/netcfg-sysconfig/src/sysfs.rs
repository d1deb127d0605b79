// ── sysfs interface discovery ──
//
// One directory per device under the network class directory. Attributes
// are read best-effort: a device may vanish between listing and reading.

use std::path::Path;

use netcfg_core::BackendError;
use netcfg_core::payload::{
    BondPayload, BridgePayload, DriverPayload, HardwarePayload, InterfacePayload, LinkPayload,
    VlanPayload,
};

use crate::files::{list_dirs, read_attr};

/// Every device present under `sysfs_dir`, sorted by name.
pub async fn discover(sysfs_dir: &Path) -> Result<Vec<InterfacePayload>, BackendError> {
    let mut payloads = Vec::new();
    for name in list_dirs(sysfs_dir).await? {
        if let Some(payload) = discover_one(sysfs_dir, &name).await {
            payloads.push(payload);
        }
    }
    Ok(payloads)
}

/// A single device, or `None` when it is not present.
pub async fn discover_one(sysfs_dir: &Path, name: &str) -> Option<InterfacePayload> {
    let dir = sysfs_dir.join(name);
    if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
        return None;
    }

    let uevent = read_attr(&dir.join("uevent")).await.unwrap_or_default();
    let devtype = uevent
        .lines()
        .find_map(|line| line.strip_prefix("DEVTYPE="))
        .map(str::to_owned);

    let bridge = if is_dir(&dir.join("bridge")).await {
        Some(BridgePayload {
            ports: list_dirs(&dir.join("brif")).await.unwrap_or_default(),
        })
    } else {
        None
    };

    let bond = if is_dir(&dir.join("bonding")).await {
        Some(BondPayload {
            // "active-backup 1"
            mode: read_attr(&dir.join("bonding/mode"))
                .await
                .and_then(|m| m.split_whitespace().next().map(str::to_owned)),
            slaves: read_attr(&dir.join("bonding/slaves"))
                .await
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
            options: None,
        })
    } else {
        None
    };

    let vlan = (devtype.as_deref() == Some("vlan")).then(|| VlanPayload {
        tag: name.rsplit_once('.').and_then(|(_, t)| t.parse().ok()),
        device: name.rsplit_once('.').map(|(parent, _)| parent.to_owned()),
    });

    let wireless = is_dir(&dir.join("wireless")).await
        || is_dir(&dir.join("phy80211")).await
        || devtype.as_deref() == Some("wlan");

    Some(InterfacePayload {
        id: None,
        name: name.to_owned(),
        kind: devtype.filter(|t| t == "dummy"),
        description: None,
        ethernet: Some(HardwarePayload {
            address: read_attr(&dir.join("address")).await,
        }),
        driver_info: Some(DriverPayload {
            driver: link_target_name(&dir.join("device/driver")).await,
        }),
        link: Some(LinkPayload {
            up: Some(link_up(&dir).await),
            master: link_target_name(&dir.join("master")).await,
            mtu: read_attr(&dir.join("mtu")).await.and_then(|m| m.parse().ok()),
        }),
        bridge,
        bond,
        vlan,
        wireless: wireless.then(|| serde_json::Value::Object(serde_json::Map::new())),
        extra: serde_json::Map::new(),
    })
}

/// `operstate` is `unknown` for devices without carrier reporting
/// (loopback, some virtual devices); fall back to `carrier` there.
async fn link_up(dir: &Path) -> bool {
    match read_attr(&dir.join("operstate")).await.as_deref() {
        Some("up") => true,
        Some("unknown") => read_attr(&dir.join("carrier")).await.as_deref() == Some("1"),
        _ => false,
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn link_target_name(path: &Path) -> Option<String> {
    let target = tokio::fs::read_link(path).await.ok()?;
    target
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
}
