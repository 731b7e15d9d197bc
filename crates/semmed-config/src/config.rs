//! Configuration sections and their defaults

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemmedConfig {
    /// Input tables
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Multi-value expansion rules
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Equivalence oracle connection
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Document output
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations and dialect of the input tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Predication table (12 columns, fixed order)
    pub predications: Option<PathBuf>,
    /// Semantic type table (`abbreviation|id|full name`)
    pub semantic_types: Option<PathBuf>,
    /// Retired concept table (`retired|_|relation|_|replacement|_`)
    pub retirements: Option<PathBuf>,
    /// Terminology names (`identifier|name|semantic type`)
    pub terminology: Option<PathBuf>,
    /// Sentence texts (`sentence id|...|text`)
    pub sentences: Option<PathBuf>,
    /// Field delimiter of the predication table
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Whether the predication table starts with a header row
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_delimiter() -> char {
    ';'
}

fn default_has_header() -> bool {
    true
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            predications: None,
            semantic_types: None,
            retirements: None,
            terminology: None,
            sentences: None,
            delimiter: default_delimiter(),
            has_header: default_has_header(),
        }
    }
}

/// How a side holding a concept identifier plus other tokens is expanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MixedFieldPolicy {
    /// Keep every token, classifying each one as concept or gene
    #[default]
    Expand,
    /// Keep only the first token/name pair
    FirstConcept,
}

impl FromStr for MixedFieldPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expand" => Ok(Self::Expand),
            "first-concept" | "first_concept" => Ok(Self::FirstConcept),
            other => Err(ConfigError::invalid(format!(
                "unknown mixed field policy '{other}' (expected 'expand' or 'first-concept')"
            ))),
        }
    }
}

impl fmt::Display for MixedFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expand => f.write_str("expand"),
            Self::FirstConcept => f.write_str("first-concept"),
        }
    }
}

/// Multi-value expansion configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Policy for sides mixing a concept identifier with other tokens
    #[serde(default)]
    pub mixed_fields: MixedFieldPolicy,
}

/// Equivalence oracle configuration
///
/// Batching and concurrency bound the load put on the remote service:
/// at most `max_concurrent` requests of `batch_size` identifiers each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Whether the collapsing step runs at all
    #[serde(default = "default_oracle_enabled")]
    pub enabled: bool,
    /// Normalization endpoint
    #[serde(default = "default_oracle_url")]
    pub url: String,
    /// Identifiers per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Requests in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Namespace tag prepended to concept identifiers
    #[serde(default = "default_concept_prefix")]
    pub concept_prefix: String,
    /// Namespace tag of gene identifiers in responses
    #[serde(default = "default_gene_prefix")]
    pub gene_prefix: String,
    /// JSON file caching answers across runs
    pub cache_path: Option<PathBuf>,
}

fn default_oracle_enabled() -> bool {
    true
}

fn default_oracle_url() -> String {
    "https://nodenormalization-sri.renci.org/get_normalized_nodes".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_max_concurrent() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_concept_prefix() -> String {
    "UMLS:".to_string()
}

fn default_gene_prefix() -> String {
    "NCBIGene:".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: default_oracle_enabled(),
            url: default_oracle_url(),
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
            concept_prefix: default_concept_prefix(),
            gene_prefix: default_gene_prefix(),
            cache_path: None,
        }
    }
}

/// Document output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON lines file; stdout when unset
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter (off, error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SemmedConfig {
    /// Check values that deserialize fine but cannot drive a run
    pub fn validate(&self) -> ConfigResult<()> {
        if self.oracle.batch_size == 0 {
            return Err(ConfigError::invalid("oracle.batch_size must be at least 1"));
        }
        if self.oracle.max_concurrent == 0 {
            return Err(ConfigError::invalid(
                "oracle.max_concurrent must be at least 1",
            ));
        }
        if self.oracle.enabled && self.oracle.url.trim().is_empty() {
            return Err(ConfigError::invalid("oracle.url must not be empty"));
        }
        if self.oracle.gene_prefix.is_empty() {
            return Err(ConfigError::invalid("oracle.gene_prefix must not be empty"));
        }
        if !self.sources.delimiter.is_ascii() {
            return Err(ConfigError::invalid(format!(
                "sources.delimiter '{}' is not a single-byte character",
                self.sources.delimiter
            )));
        }
        Ok(())
    }
}
