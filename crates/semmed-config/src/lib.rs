//! # Semmed Configuration
//!
//! Type-safe configuration for the predication normalization pipeline.
//!
//! Every section has working defaults, so an empty file (or no file at all)
//! yields a usable configuration. Values are layered with the precedence
//! `defaults < TOML file < SEMMED_* environment < command line`; the CLI
//! applies the last layer itself.
//!
//! ```rust,no_run
//! use semmed_config::SemmedConfig;
//!
//! let config = SemmedConfig::load(None)?;
//! assert!(config.oracle.batch_size > 0);
//! # Ok::<(), semmed_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::*;
pub use loader::*;
