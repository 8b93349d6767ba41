//! Clap derive structures for the `aosom` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aosom -- command-line access to Apstra AOS servers
#[derive(Debug, Parser)]
#[command(
    name = "aosom",
    version,
    about = "Work with Apstra AOS servers from the command line",
    long_about = "Browse, export and change AOS resources by name.\n\n\
        Collections are addressed by registry name (IpPools, ip_pools, ...);\n\
        run `aosom resources` for the full list.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "AOSOM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// AOS server host name (overrides profile and AOS_SERVER)
    #[arg(long, short = 's', global = true)]
    pub server: Option<String>,

    /// AOS server API port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Login user name
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "AOSOM_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "AOSOM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the resource types this client knows
    #[command(alias = "res")]
    Resources,

    /// List the items of a resource collection
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one item by name
    #[command(alias = "get")]
    Show(ItemArgs),

    /// Create an item from a JSON file
    Create(CreateArgs),

    /// Delete an item by name
    #[command(alias = "rm")]
    Delete(ItemArgs),

    /// Save an item to a JSON file
    Export(ExportArgs),

    /// Blueprint build status, slots and cabling
    #[command(alias = "bp")]
    Blueprint(BlueprintArgs),

    /// Device approval
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Collection commands ──────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Resource type (e.g. IpPools, ip_pools, Devices)
    pub resource: String,
}

#[derive(Debug, Args)]
pub struct ItemArgs {
    /// Resource type (e.g. IpPools, ip_pools, Devices)
    pub resource: String,

    /// Item name (display name, or device key for Devices)
    pub name: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Resource type (e.g. IpPools, ip_pools, Devices)
    pub resource: String,

    /// Name of the new item
    pub name: String,

    /// JSON file holding the item value
    #[arg(long, short = 'f')]
    pub from_file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Resource type (e.g. IpPools, ip_pools, Devices)
    pub resource: String,

    /// Item name
    pub name: String,

    /// Directory to write into (current directory when omitted)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// File name (`<name>.json` when omitted)
    #[arg(long)]
    pub filename: Option<String>,

    /// JSON indentation width
    #[arg(long, default_value = "3")]
    pub indent: usize,
}

// ── Blueprint ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BlueprintArgs {
    #[command(subcommand)]
    pub command: BlueprintCommand,
}

#[derive(Debug, Subcommand)]
pub enum BlueprintCommand {
    /// Wait until a blueprint has no build errors
    Ready {
        /// Blueprint name
        name: String,

        /// Give up after this many milliseconds
        #[arg(long, default_value = "60000")]
        timeout_ms: u64,
    },

    /// Show the current build errors of a blueprint
    Errors {
        /// Blueprint name
        name: String,
    },

    /// List the resource slots of a blueprint
    Slots {
        /// Blueprint name
        name: String,
    },

    /// List the cabling links of a blueprint
    Cabling {
        /// Blueprint name
        name: String,
    },
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Approve a quarantined device into the default pool
    Approve {
        /// Device key (serial number)
        device_key: String,

        /// Location recorded in the device user config
        #[arg(long)]
        location: Option<String>,
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
    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
