//! Error types for the fallible pipeline steps
//!
//! Filtering, expansion, retirement resolution and grouping never fail: bad
//! rows and unresolvable identifiers are dropped and counted. Only the
//! equivalence lookup can fail, and its failure is fatal for the run.

use thiserror::Error;

/// Errors reported by an equivalence oracle implementation
#[derive(Debug, Error)]
pub enum OracleError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("Oracle request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status
    #[error("Oracle returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode oracle response: {0}")]
    Decode(String),

    /// Reading or writing the answer cache failed
    #[error("Oracle cache error: {0}")]
    Cache(String),
}

/// Specialized Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;

impl OracleError {
    /// Create a request error
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}

/// Errors from the equivalence collapsing step
#[derive(Debug, Error)]
pub enum CollapseError {
    /// One batch failed; the whole step is abandoned
    #[error("Equivalence lookup failed for batch {batch} ({size} identifiers): {source}")]
    Batch {
        /// Zero-based batch index
        batch: usize,
        /// Identifiers in the failed batch
        size: usize,
        /// Oracle failure
        #[source]
        source: OracleError,
    },

    /// Batching parameters cannot drive a lookup
    #[error("Invalid collapser configuration: {0}")]
    InvalidConfig(String),
}

/// Specialized Result type for the collapsing step
pub type CollapseResult<T> = Result<T, CollapseError>;
