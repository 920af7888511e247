//! Clap derive structures for the `bmsly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bmsly -- CLI for the Vyntar BMS telemetry platform
#[derive(Debug, Parser)]
#[command(
    name = "bmsly",
    version,
    about = "Query the Vyntar BMS telemetry platform from the command line",
    long_about = "A CLI for building-management telemetry: device inventory,\n\
        consumption charts, raw device logs, and station reports.\n\n\
        Authenticates against the BMS API with username/password and keeps\n\
        the session (access + refresh tokens) in a per-profile file.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "BMSLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "BMSLY_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BMSLY_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BMSLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Log in and store the session for this profile
    Login(LoginArgs),

    /// End the session and clear stored tokens
    Logout,

    /// Show the authenticated user's profile
    #[command(alias = "me")]
    Whoami,

    /// Fleet-wide dashboard summary
    #[command(alias = "ov")]
    Overview,

    /// Device (slave) inventory and charts
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Raw device telemetry logs
    Logs(LogsArgs),

    /// Station-keyed consumption reports
    #[command(alias = "rep")]
    Reports(ReportsArgs),

    /// Temperature monitoring
    Temp(TempArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (falls back to the profile, then prompts)
    #[arg(long, short = 'u', env = "BMSLY_USERNAME")]
    pub username: Option<String>,

    /// Feature area to select after login
    #[arg(long)]
    pub app: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all monitored devices
    #[command(alias = "ls")]
    List,

    /// Last-7-days consumption series for one device
    Consumption {
        /// Device (slave) id
        slave_id: i64,
    },
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Device (slave) id
    pub slave_id: i64,

    /// Range start (RFC 3339, e.g. 2025-06-01T00:00:00Z)
    #[arg(long)]
    pub start: chrono::DateTime<chrono::Utc>,

    /// Range end (RFC 3339)
    #[arg(long)]
    pub end: chrono::DateTime<chrono::Utc>,

    /// Page size
    #[arg(long, default_value = "100")]
    pub limit: u32,

    /// Page offset
    #[arg(long, default_value = "0")]
    pub offset: u32,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// Per-day values for one month, keyed by station
    DateWise {
        /// Report family
        #[arg(value_enum)]
        kind: DateWiseKind,

        /// Month (1-12)
        #[arg(long)]
        month: u32,

        /// Year (e.g. 2025)
        #[arg(long)]
        year: i32,
    },

    /// Per-month values for one year, keyed by station
    MonthWise {
        /// Report family
        #[arg(value_enum)]
        kind: MonthWiseKind,

        /// Year (e.g. 2025)
        #[arg(long)]
        year: i32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateWiseKind {
    Consumption,
    Reading,
    ConsumptionCost,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MonthWiseKind {
    Consumption,
    ConsumptionCost,
}

// ── Temperature ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TempArgs {
    #[command(subcommand)]
    pub command: TempCommand,
}

#[derive(Debug, Subcommand)]
pub enum TempCommand {
    /// List temperature-monitoring devices
    #[command(alias = "ls")]
    Devices,

    /// Time-series analytics for one device
    Analytics {
        /// Device (slave) id
        slave_id: i64,

        /// Sensor channels to include (repeatable)
        #[arg(long = "param", required = true)]
        parameters: Vec<String>,

        /// Range start (RFC 3339)
        #[arg(long)]
        from: chrono::DateTime<chrono::Utc>,

        /// Range end (RFC 3339)
        #[arg(long)]
        to: chrono::DateTime<chrono::Utc>,
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
    /// Interactive configuration wizard
    Init,

    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
