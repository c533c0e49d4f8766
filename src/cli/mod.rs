//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tickgraph_engine::{ErrorPolicy, WarmupPolicy};

#[derive(Parser)]
#[command(name = "tickgraph")]
#[command(author, version, about = "Incremental evaluation of composed indicator graphs")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TICKGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate y = 2x + 50 over a counter
    Demo(DemoArgs),
    /// Bollinger bands over one CSV column
    Bands(BandsArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Engine overrides shared by evaluating commands.
#[derive(clap::Args)]
pub struct EngineArgs {
    /// Warm-up policy (defaults to the configuration file)
    #[arg(long)]
    pub warmup: Option<WarmupArg>,

    /// Error policy (defaults to the configuration file)
    #[arg(long)]
    pub on_error: Option<ErrorArg>,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WarmupArg {
    AllRoots,
    Partial,
}

impl From<WarmupArg> for WarmupPolicy {
    fn from(arg: WarmupArg) -> Self {
        match arg {
            WarmupArg::AllRoots => WarmupPolicy::AllRoots,
            WarmupArg::Partial => WarmupPolicy::Partial,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ErrorArg {
    Mark,
    CloseLane,
}

impl From<ErrorArg> for ErrorPolicy {
    fn from(arg: ErrorArg) -> Self {
        match arg {
            ErrorArg::Mark => ErrorPolicy::Mark,
            ErrorArg::CloseLane => ErrorPolicy::CloseLane,
        }
    }
}

#[derive(clap::Args)]
pub struct DemoArgs {
    /// Number of ticks
    #[arg(short = 'n', long, default_value = "10")]
    pub ticks: u32,

    /// Feed x from a timer-driven async source
    #[arg(long = "async")]
    pub use_async: bool,

    /// Milliseconds between ticks of the async source
    #[arg(long, default_value = "100")]
    pub interval_ms: u64,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(clap::Args)]
pub struct BandsArgs {
    /// CSV file
    pub path: PathBuf,

    /// Column to read (defaults to the configuration file)
    #[arg(long)]
    pub column: Option<String>,

    /// Column to order rows by (defaults to the configuration file)
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Moving average period
    #[arg(short, long, default_value = "20")]
    pub period: usize,

    /// Band width in standard deviations
    #[arg(short, long, default_value = "2.0")]
    pub k: f64,

    #[command(flatten)]
    pub engine: EngineArgs,
}
