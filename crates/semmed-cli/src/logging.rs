//! Tracing subscriber setup

use crate::cli::LogLevel;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown; dependencies stay quiet
const LOG_TARGETS: [&str; 5] = [
    "semmed_cli",
    "semmed_config",
    "semmed_core",
    "semmed_io",
    "semmed_pipeline",
];

/// Effective level: `--log-level`, then `--verbose`, then the config value
pub fn level_filter(cli_level: Option<LogLevel>, verbose: bool, configured: &str) -> LevelFilter {
    match (cli_level, verbose) {
        (Some(level), _) => level.into(),
        (None, true) => LevelFilter::DEBUG,
        (None, false) => configured.parse().unwrap_or(LevelFilter::INFO),
    }
}

/// Directive string enabling `level` for the semmed crates
pub fn filter_directives(level: LevelFilter) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber, writing to stderr so stdout stays free
/// for documents
pub fn init(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directives(level)))
        .with_writer(std::io::stderr)
        .init();
}
