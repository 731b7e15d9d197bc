use anyhow::{Context, Result};
use clap::Parser;
use semmed_cli::cli::{Cli, Commands, ConfigCommands};
use semmed_cli::{commands, logging};
use semmed_config::SemmedConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config init` must work even when the existing file does not parse
    if let Commands::Config(ConfigCommands::Init { path, force }) = cli.command {
        logging::init(logging::level_filter(cli.log_level, cli.verbose, "info"));
        return commands::config::init(path, force);
    }

    let config = SemmedConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(logging::level_filter(
        cli.log_level,
        cli.verbose,
        &config.logging.level,
    ));

    match cli.command {
        Commands::Build(args) => commands::build::execute(config, args).await.map(|_| ()),
        Commands::Mapping => commands::mapping::execute(),
        Commands::Config(cmd) => commands::config::execute(cmd, cli.config.as_deref()),
    }
}
