use clap::{Parser, Subcommand, ValueEnum};
use semmed_config::MixedFieldPolicy;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "semmed")]
#[command(about = "semmed - normalize literature-derived predications into graph documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'info'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/semmed/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the pipeline and write documents as JSON lines
    Build(BuildArgs),

    /// Print the index mapping of emitted documents
    Mapping,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Options of `semmed build`; each one overrides the config file
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BuildArgs {
    /// Predication table
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (stdout when neither this nor the config names one)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Node-normalization endpoint
    #[arg(long)]
    pub oracle_url: Option<String>,

    /// Identifiers per oracle request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Oracle requests in flight
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// File caching oracle answers between runs
    #[arg(long)]
    pub oracle_cache: Option<PathBuf>,

    /// Expansion of sides mixing concept and gene identifiers
    #[arg(long, value_parser = parse_policy)]
    pub mixed_fields: Option<MixedFieldPolicy>,

    /// Skip equivalence collapsing (no oracle requests)
    #[arg(long)]
    pub no_collapse: bool,
}

fn parse_policy(value: &str) -> Result<MixedFieldPolicy, String> {
    value.parse().map_err(|e: semmed_config::ConfigError| e.to_string())
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write an example config file
    Init {
        /// Destination (defaults to ~/.config/semmed/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        /// Output format (toml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}
