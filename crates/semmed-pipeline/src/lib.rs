//! Pipeline Orchestration Layer
//!
//! Runs the normalization steps from `semmed-core` in order and reports
//! per-phase counts and timings:
//!
//! 1. **Filter**: drop malformed and zero-novelty rows
//! 2. **Expand**: split multi-valued identifier fields
//! 3. **Resolve**: replace retired concept identifiers
//! 4. **Collapse**: drop oracle-confirmed expansion duplicates (optional)
//! 5. **Group**: build evidence-aggregated documents
//!
//! This crate coordinates; the steps themselves live in `semmed-core` and the
//! table readers, oracle client and sinks in `semmed-io`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use semmed_pipeline::{PredicationPipeline, ReferenceData};
//!
//! let reference = ReferenceData::load(&config.sources)?;
//! let oracle = semmed_pipeline::build_oracle(&config.oracle)?;
//! let pipeline = PredicationPipeline::from_config(reference, oracle, &config)?;
//!
//! let output = pipeline.run(rows).await?;
//! ```

pub mod predication_pipeline;
pub mod reference;

pub use predication_pipeline::*;
pub use reference::{build_oracle, ReferenceData};
