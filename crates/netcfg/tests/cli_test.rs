//! Integration tests for the `netcfg` CLI binary.
//!
//! Each test points the binary at a temp sysconfig directory, a fake sysfs
//! tree and a config path inside the same temp dir.
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Temp root with `sysconfig/`, `sysfs/eth0` and `sysfs/eth1`.
fn host() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("sysconfig")).unwrap();
    for (name, state) in [("eth0", "up"), ("eth1", "down")] {
        let dir = root.path().join("sysfs").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("operstate"), format!("{state}\n")).unwrap();
        fs::write(dir.join("address"), "52:54:00:ab:cd:ef\n").unwrap();
    }
    root
}

/// Build a [`Command`] for the `netcfg` binary with env isolation.
fn netcfg_cmd(root: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netcfg");
    cmd.env("HOME", root.join("home"))
        .env("XDG_CONFIG_HOME", root.join("home/.config"))
        .env_remove("NETCFG_CONFIG")
        .env_remove("NETCFG_OUTPUT")
        .env_remove("NETCFG_SYSCONFIG_DIR")
        .env_remove("NETCFG_SYSFS_DIR")
        .env_remove("NETCFG_VALIDATE")
        .env_remove("NETCFG_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(root.join("config.toml"))
        .arg("--sysconfig-dir")
        .arg(root.join("sysconfig"))
        .arg("--sysfs-dir")
        .arg(root.join("sysfs"));
    cmd
}

fn stdout_of(cmd: &mut assert_cmd::Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cargo_bin_cmd!("netcfg").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("netcfg")
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("interfaces")
                .and(predicate::str::contains("connections"))
                .and(predicate::str::contains("routes"))
                .and(predicate::str::contains("render")),
        );
}

// ── Interfaces & connections ────────────────────────────────────────

#[test]
fn test_interfaces_plain() {
    let root = host();
    let out = stdout_of(netcfg_cmd(root.path()).args(["-o", "plain", "interfaces"]));
    assert_eq!(out, "eth0\neth1\n");
}

#[test]
fn test_unconfigured_interfaces_list_as_placeholders() {
    let root = host();
    let out = stdout_of(netcfg_cmd(root.path()).args(["-o", "json", "connections", "list"]));
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "eth0");
    assert_eq!(list[0]["exists"], false);
}

#[test]
fn test_add_then_render_connection() {
    let root = host();
    netcfg_cmd(root.path())
        .args([
            "connections", "add", "eth0", "--address", "10.0.0.1/24", "--address",
            "fd00::1/64", "--mtu", "9000",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Connection 'eth0' added"));

    assert!(root.path().join("sysconfig/ifcfg-eth0").exists());

    let out = stdout_of(netcfg_cmd(root.path()).args(["render", "connection", "eth0"]));
    insta::assert_snapshot!(out, @r#"
    BOOTPROTO="static"
    STARTMODE="auto"
    MTU="9000"
    IPADDR="10.0.0.1/24"
    IPADDR_1="fd00::1/64"
    "#);

    // Adding it again conflicts.
    netcfg_cmd(root.path())
        .args(["connections", "add", "eth0", "--dhcp4"])
        .assert()
        .code(6);
}

#[test]
fn test_set_connection_switches_to_dhcp() {
    let root = host();
    fs::write(
        root.path().join("sysconfig/ifcfg-eth1"),
        "BOOTPROTO='static'\nSTARTMODE='auto'\nIPADDR='10.1.0.1/24'\n",
    )
    .unwrap();

    netcfg_cmd(root.path())
        .args(["connections", "set", "eth1", "--dhcp4", "--start-mode", "hotplug"])
        .assert()
        .success();

    let text = fs::read_to_string(root.path().join("sysconfig/ifcfg-eth1")).unwrap();
    assert!(text.contains("BOOTPROTO=\"dhcp4\""), "{text}");
    assert!(text.contains("STARTMODE=\"hotplug\""), "{text}");
    assert!(!text.contains("IPADDR"), "{text}");
}

#[test]
fn test_invalid_connection_is_rejected() {
    let root = host();
    netcfg_cmd(root.path())
        .args([
            "connections", "add", "eth0.5000", "--type", "vlan", "--vlan-id", "5000",
            "--vlan-parent", "eth0",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid connection"));
    assert!(!root.path().join("sysconfig/ifcfg-eth0.5000").exists());
}

#[test]
fn test_delete_connection() {
    let root = host();
    fs::write(root.path().join("sysconfig/ifcfg-eth0"), "BOOTPROTO='dhcp'\n").unwrap();

    netcfg_cmd(root.path())
        .args(["connections", "delete", "eth0"])
        .assert()
        .success();
    assert!(!root.path().join("sysconfig/ifcfg-eth0").exists());

    // Only a placeholder is left now.
    netcfg_cmd(root.path())
        .args(["connections", "delete", "eth0"])
        .assert()
        .code(4);
}

#[test]
fn test_unknown_connection_is_not_found() {
    let root = host();
    netcfg_cmd(root.path())
        .args(["connections", "get", "wlan7"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("connection 'wlan7' not found"));
}

#[test]
fn test_up_unknown_interface() {
    let root = host();
    netcfg_cmd(root.path()).args(["up", "eth7"]).assert().code(4);
}

// ── Routes ──────────────────────────────────────────────────────────

#[test]
fn test_routes_add_list_delete() {
    let root = host();
    netcfg_cmd(root.path())
        .args(["routes", "add", "default", "192.168.0.1"])
        .assert()
        .success();
    netcfg_cmd(root.path())
        .args(["routes", "add", "10.9.0.0/16", "10.0.0.254", "--device", "eth0"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(root.path().join("sysconfig/routes")).unwrap(),
        "default\t192.168.0.1\t-\t-\t-\n"
    );
    assert_eq!(
        fs::read_to_string(root.path().join("sysconfig/ifroute-eth0")).unwrap(),
        "10.9.0.0/16\t10.0.0.254\t-\t-\t-\n"
    );

    let out = stdout_of(netcfg_cmd(root.path()).args(["-o", "plain", "routes", "list"]));
    assert_eq!(out, "default\n10.9.0.0/16\n");

    let out = stdout_of(netcfg_cmd(root.path()).args(["render", "routes", "--device", "eth0"]));
    assert_eq!(out, "10.9.0.0/16\t10.0.0.254\t-\t-\t-\n");

    netcfg_cmd(root.path())
        .args(["routes", "delete", "10.9.0.0/16"])
        .assert()
        .success();
    assert!(!root.path().join("sysconfig/ifroute-eth0").exists());

    netcfg_cmd(root.path())
        .args(["routes", "delete", "10.9.0.0/16"])
        .assert()
        .code(4);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_and_show() {
    let root = host();
    netcfg_cmd(root.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(root.path().join("config.toml").exists());

    netcfg_cmd(root.path())
        .args(["config", "init"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("--force"));

    let out = stdout_of(netcfg_cmd(root.path()).args(["config", "show"]));
    assert!(out.contains("poll_interval_secs = 5"), "{out}");
    // Flags override the file.
    assert!(out.contains(&root.path().join("sysconfig").display().to_string()), "{out}");
}

#[test]
fn test_broken_config_is_reported() {
    let root = host();
    fs::write(root.path().join("config.toml"), "log_level = \"shouting\"\n").unwrap();

    netcfg_cmd(root.path())
        .arg("interfaces")
        .assert()
        .failure()
        .stderr(predicate::str::contains("log_level"));

    // `config path` still works.
    netcfg_cmd(root.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}
