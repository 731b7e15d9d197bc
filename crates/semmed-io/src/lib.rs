//! # Semmed IO
//!
//! Everything the core pipeline steps treat as a collaborator:
//!
//! - [`predications`]: the predication table reader
//! - [`tables`]: loaders for the pipe-delimited reference tables
//! - [`oracle`]: the node-normalization HTTP client
//! - [`cache`]: a file-backed answer cache wrapping any oracle
//! - [`sink`]: JSON-lines document output

pub mod cache;
pub mod error;
pub mod oracle;
pub mod predications;
pub mod sink;
pub mod tables;

pub use cache::CachedEquivalenceOracle;
pub use error::{SourceError, SourceResult};
pub use oracle::HttpEquivalenceOracle;
pub use predications::{PredicationReader, ReadStats};
pub use sink::JsonLinesSink;
pub use tables::{load_retirements, load_semantic_types, load_sentences, load_terminology};
