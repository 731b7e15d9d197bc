use anyhow::{bail, Context, Result};
use semmed_config::SemmedConfig;
use std::path::{Path, PathBuf};

use crate::cli::ConfigCommands;

/// Execute config subcommand
pub fn execute(cmd: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path, force),
        ConfigCommands::Show { format } => {
            let config = SemmedConfig::load(config_path).context("Failed to load configuration")?;
            println!("{}", render(&config, &format)?);
            Ok(())
        }
    }
}

/// Write the example config file
pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => SemmedConfig::default_path().context("Could not determine config file path")?,
    };

    if config_path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    SemmedConfig::write_example(&config_path)?;
    println!("Created config file at: {}", config_path.display());
    Ok(())
}

/// Render the effective configuration as TOML or JSON
pub fn render(config: &SemmedConfig, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "toml" => Ok(config.to_toml()?),
        other => bail!("Unknown format '{other}' (expected toml or json)"),
    }
}
