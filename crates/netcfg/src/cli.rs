//! Clap derive structures for the `netcfg` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use netcfg_core::{InterfaceKind, StartMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netcfg -- inspect and edit sysconfig network configuration
#[derive(Debug, Parser)]
#[command(
    name = "netcfg",
    version,
    about = "Inspect and edit sysconfig network configuration",
    long_about = "Reads interfaces from sysfs and connections from ifcfg-* files,\n\
        and writes changes back to /etc/sysconfig/network.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: platform config dir)
    #[arg(long, env = "NETCFG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// sysconfig directory (overrides config)
    #[arg(long, global = true)]
    pub sysconfig_dir: Option<PathBuf>,

    /// sysfs network class directory (overrides config)
    #[arg(long, global = true)]
    pub sysfs_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETCFG_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Skip validation of new and changed connections
    #[arg(long, global = true)]
    pub no_validate: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one name per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show interfaces present on the host
    #[command(alias = "if", alias = "i")]
    Interfaces,

    /// Manage connections (ifcfg files)
    #[command(alias = "conn", alias = "c")]
    Connections(ConnectionsArgs),

    /// Bring an interface up
    Up {
        /// Interface name
        name: String,
    },

    /// Take an interface down
    Down {
        /// Interface name
        name: String,
    },

    /// Manage static routes
    #[command(alias = "r")]
    Routes(RoutesArgs),

    /// Print file contents as they would be written
    Render(RenderArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ── Connections ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: ConnectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConnectionsCommand {
    /// List connections, including placeholders for unconfigured interfaces
    #[command(alias = "ls")]
    List,

    /// Show one connection
    Get {
        /// Connection name
        name: String,
    },

    /// Create a connection
    Add(AddConnectionArgs),

    /// Change fields of an existing connection
    Set(SetConnectionArgs),

    /// Delete a connection and take its interface down
    #[command(alias = "rm")]
    Delete {
        /// Connection name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct AddConnectionArgs {
    /// Connection (interface) name
    pub name: String,

    /// Interface kind
    #[arg(long = "type", short = 't', default_value = "ethernet", value_parser = parse_kind)]
    pub kind: InterfaceKind,

    /// Start mode
    #[arg(long, default_value = "auto", value_parser = parse_start_mode)]
    pub start_mode: StartMode,

    /// Use DHCP for IPv4
    #[arg(long)]
    pub dhcp4: bool,

    /// Use DHCP for IPv6
    #[arg(long)]
    pub dhcp6: bool,

    /// Static address in CIDR notation (repeatable, IPv4 or IPv6)
    #[arg(long = "address", short = 'a')]
    pub addresses: Vec<String>,

    /// MTU
    #[arg(long)]
    pub mtu: Option<u32>,

    /// Bridge port (repeatable, bridges only)
    #[arg(long = "port")]
    pub ports: Vec<String>,

    /// Bond slave (repeatable, bonds only)
    #[arg(long = "slave")]
    pub slaves: Vec<String>,

    /// Bond mode
    #[arg(long)]
    pub bond_mode: Option<String>,

    /// Extra bonding module options
    #[arg(long)]
    pub bond_options: Option<String>,

    /// VLAN id (vlans only)
    #[arg(long)]
    pub vlan_id: Option<u16>,

    /// VLAN parent device (vlans only)
    #[arg(long)]
    pub vlan_parent: Option<String>,
}

#[derive(Debug, Args)]
pub struct SetConnectionArgs {
    /// Connection name
    pub name: String,

    /// New start mode
    #[arg(long, value_parser = parse_start_mode)]
    pub start_mode: Option<StartMode>,

    /// New MTU
    #[arg(long)]
    pub mtu: Option<u32>,

    /// Switch IPv4 to DHCP, dropping static IPv4 addresses
    #[arg(long, conflicts_with = "addresses")]
    pub dhcp4: bool,

    /// Replace the static addresses (repeatable)
    #[arg(long = "address", short = 'a')]
    pub addresses: Vec<String>,
}

// ── Routes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List static routes
    #[command(alias = "ls")]
    List {
        /// Only routes of this device
        #[arg(long, short = 'd')]
        device: Option<String>,
    },

    /// Append a static route
    Add {
        /// Destination (`default` or CIDR)
        destination: String,
        /// Gateway address
        gateway: Option<String>,
        /// Netmask
        #[arg(long)]
        netmask: Option<String>,
        /// Device; routes with a device are written to ifroute-<device>
        #[arg(long, short = 'd')]
        device: Option<String>,
        /// Extra route options
        #[arg(long)]
        options: Option<String>,
    },

    /// Remove every route to a destination
    #[command(alias = "rm")]
    Delete {
        /// Destination to remove
        destination: String,
        /// Only routes of this device
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

// ── Render ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(subcommand)]
    pub command: RenderCommand,
}

#[derive(Debug, Subcommand)]
pub enum RenderCommand {
    /// The ifcfg file of a connection
    Connection {
        /// Connection name
        name: String,
    },

    /// A route file: `routes`, or `ifroute-<device>` with --device
    Routes {
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file path
    Path,

    /// Write the default configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_kind(s: &str) -> Result<InterfaceKind, String> {
    s.parse()
        .map_err(|_| format!("unknown interface type '{s}'"))
}

fn parse_start_mode(s: &str) -> Result<StartMode, String> {
    s.parse().map_err(|_| format!("unknown start mode '{s}'"))
}
