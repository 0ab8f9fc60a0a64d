//! Clap derive structures for the `lightsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lightsync -- control and watch a zigbee lighting server
#[derive(Debug, Parser)]
#[command(
    name = "lightsync",
    version,
    about = "Control lights, switches and buttons on a zigbee lighting server",
    long_about = "Lists lights and switches grouped the way the server groups them,\n\
        sends optimistic commands, presses configured buttons and follows\n\
        live updates over the server's push channel.",
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
    #[arg(long, short = 'p', env = "LIGHTSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server base URL (overrides profile)
    #[arg(long, short = 's', env = "LIGHTSYNC_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LIGHTSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LIGHTSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LIGHTSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Keep the metadata cache in memory for this run only
    #[arg(long, global = true)]
    pub no_cache: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Show the grouped view: server groups, then Others
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// List lights and switches
    #[command(alias = "ls")]
    Things(ThingsArgs),

    /// Change state, brightness, color or effect of one thing
    Set(SetArgs),

    /// Press a configured button
    Press {
        /// Button name as configured in the profile
        name: String,
    },

    /// Turn every light in a group on or off
    Group(GroupArgs),

    /// Follow live updates until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Show metadata for one thing
    Meta {
        /// Thing name
        name: String,
    },

    /// Manage the local metadata cache
    Cache(CacheArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Filter Arguments ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Light,
    Switch,
}

/// Filters shared by `things` and `watch`.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Only lights or only switches
    #[arg(long, short = 't')]
    pub kind: Option<KindArg>,

    /// Only things whose name starts with this group prefix
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Only things that are on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Only things that are off
    #[arg(long)]
    pub off: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VIEW
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    /// Show only this group's members
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ThingsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMMANDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("change")
        .required(true)
        .multiple(true)
        .args(["on", "off", "brightness", "color_temp", "color", "effect"])
))]
pub struct SetArgs {
    /// Thing name
    pub name: String,

    /// Switch on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Switch off
    #[arg(long)]
    pub off: bool,

    /// Brightness, 0-254 (higher values are clamped)
    #[arg(long, short = 'b')]
    pub brightness: Option<u8>,

    /// Color temperature in mireds
    #[arg(long)]
    pub color_temp: Option<u64>,

    /// RGB color as #rrggbb
    #[arg(long)]
    pub color: Option<String>,

    /// Effect name
    #[arg(long)]
    pub effect: Option<String>,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Group name as shown by `lightsync groups`
    pub name: String,

    #[command(subcommand)]
    pub action: GroupActionArg,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum GroupActionArg {
    /// Turn every light in the group on
    On,
    /// Turn every light in the group off
    Off,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CACHE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Drop cached metadata and refetch everything
    Clear,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Create or update a profile
    Add {
        /// Profile name
        name: String,

        /// Server base URL
        #[arg(long)]
        server: String,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
