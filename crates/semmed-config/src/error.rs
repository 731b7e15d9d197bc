//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing a config file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::SemmedConfig`]
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Serializing the effective configuration failed
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The platform has no config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Specialized Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid-value error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
