//! Config file discovery, parsing and environment overrides

use crate::config::SemmedConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SEMMED_";

const EXAMPLE_CONFIG: &str = r#"# semmed configuration
# Location: ~/.config/semmed/config.toml

[sources]
# Predication table: 12 columns in fixed order
predications = "/data/semmed/predications.csv"
# Semantic type names: abbreviation|id|full name
semantic_types = "/data/semmed/SemanticTypes_2013AA.txt"
# Retired concepts: retired|_|relation|_|replacement|_
retirements = "/data/umls/MRCUI.RRF"
# Terminology names for replacement concepts: identifier|name|semantic type
terminology = "/data/umls/concept_names.txt"
# Optional sentence texts: sentence id|pmid|section|number|text
# sentences = "/data/semmed/sentences.txt"
delimiter = ";"
has_header = true

[expansion]
# "expand" keeps every token of a multi-valued side,
# "first-concept" keeps only the first token of a side holding a concept id
mixed_fields = "expand"

[oracle]
enabled = true
url = "https://nodenormalization-sri.renci.org/get_normalized_nodes"
batch_size = 1000
max_concurrent = 10
timeout_secs = 60
concept_prefix = "UMLS:"
gene_prefix = "NCBIGene:"
# cache_path = "/data/semmed/equivalence_cache.json"

[output]
# JSON lines; stdout when unset
# path = "/data/semmed/documents.jsonl"

[logging]
level = "info"
"#;

impl SemmedConfig {
    /// Load configuration: defaults, then the file, then `SEMMED_*` variables
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                Ok(_) => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `SEMMED_*` overrides read through `lookup`
    ///
    /// Taking the lookup as a function keeps tests away from the process
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(path) = var("PREDICATIONS") {
            self.sources.predications = Some(PathBuf::from(path));
        }
        if let Some(url) = var("ORACLE_URL") {
            self.oracle.url = url;
        }
        if let Some(size) = var("ORACLE_BATCH_SIZE") {
            self.oracle.batch_size = parse_number("ORACLE_BATCH_SIZE", &size)?;
        }
        if let Some(max) = var("ORACLE_MAX_CONCURRENT") {
            self.oracle.max_concurrent = parse_number("ORACLE_MAX_CONCURRENT", &max)?;
        }
        if let Some(secs) = var("ORACLE_TIMEOUT_SECS") {
            self.oracle.timeout_secs = parse_number("ORACLE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(path) = var("ORACLE_CACHE") {
            self.oracle.cache_path = Some(PathBuf::from(path));
        }
        if let Some(policy) = var("MIXED_FIELDS") {
            self.expansion.mixed_fields = policy.parse()?;
        }
        if let Some(path) = var("OUTPUT") {
            self.output.path = Some(PathBuf::from(path));
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Default config file location (`~/.config/semmed/config.toml`)
    pub fn default_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("semmed").join("config.toml"))
    }

    /// Write a commented example config file
    pub fn write_example(path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, EXAMPLE_CONFIG).map_err(io_err)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::invalid(format!("{ENV_PREFIX}{name}='{value}' is not a valid number"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MixedFieldPolicy;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_example_config_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        SemmedConfig::write_example(&path).unwrap();
        let config = SemmedConfig::from_file(&path).unwrap();

        assert_eq!(config.sources.delimiter, ';');
        assert_eq!(config.oracle.batch_size, 1000);
        assert_eq!(config.oracle.cache_path, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = SemmedConfig::load(Some(temp.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[oracle\nbatch_size = ").unwrap();

        let err = SemmedConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = SemmedConfig::default();
        let vars = env(&[
            ("SEMMED_ORACLE_URL", "http://localhost:9000/normalize"),
            ("SEMMED_ORACLE_BATCH_SIZE", "50"),
            ("SEMMED_MIXED_FIELDS", "first-concept"),
            ("SEMMED_LOG_LEVEL", "debug"),
        ]);

        config
            .apply_env_overrides(|key| vars.get(key).cloned())
            .unwrap();

        assert_eq!(config.oracle.url, "http://localhost:9000/normalize");
        assert_eq!(config.oracle.batch_size, 50);
        assert_eq!(config.oracle.max_concurrent, 10);
        assert_eq!(config.expansion.mixed_fields, MixedFieldPolicy::FirstConcept);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_override_rejects_garbage_number() {
        let mut config = SemmedConfig::default();
        let vars = env(&[("SEMMED_ORACLE_MAX_CONCURRENT", "lots")]);

        let err = config
            .apply_env_overrides(|key| vars.get(key).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("SEMMED_ORACLE_MAX_CONCURRENT"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = SemmedConfig::default();
        config.oracle.cache_path = Some(PathBuf::from("/tmp/cache.json"));

        let rendered = config.to_toml().unwrap();
        let parsed: SemmedConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
