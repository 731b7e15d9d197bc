//! Output sinks for grouped documents
//!
//! A sink receives documents one at a time in document-id order and is
//! flushed once at the end of a run. Implementations live in `semmed-io`
//! (JSON lines to a file or stdout) and in [`crate::test_support::mocks`].

use crate::types::Document;
use async_trait::async_trait;
use thiserror::Error;

/// Sink operation errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Specialized Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

impl SinkError {
    /// Create a write failure error
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Destination for grouped documents
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Write one document
    async fn write(&self, document: &Document) -> SinkResult<()>;

    /// Flush buffered output; called once after the last document
    async fn flush(&self) -> SinkResult<()>;

    /// Human-readable sink name for logs
    fn name(&self) -> &'static str;
}
