//! Errors raised while reading input tables

use std::path::PathBuf;
use thiserror::Error;

/// Failure to open or read an input table
///
/// Individual malformed lines are not errors; readers skip and count them.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A delimiter that cannot be used as a single csv byte
    #[error("Unsupported delimiter {0:?}")]
    Delimiter(char),
}

/// Specialized Result type for table reading
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
