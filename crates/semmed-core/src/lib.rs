//! # Semmed Core
//!
//! The predication normalization pipeline, step by step:
//!
//! 1. [`filter`]: drop structurally invalid or zero-novelty rows
//! 2. [`expand`]: split multi-valued identifier fields into atomic facts
//! 3. [`retirement`]: replace retired concept identifiers
//! 4. [`equivalence`]: drop expansion duplicates the equivalence oracle
//!    reports as the same gene
//! 5. [`grouping`]: group atomic facts into evidence-aggregated documents
//!
//! Every step takes ownership of the previous record set and returns a new
//! one. Lookup tables ([`reference`]) are built once by the caller and passed
//! in read-only. Only step 4 performs I/O, through the [`EquivalenceOracle`]
//! trait; file readers, the HTTP oracle and sinks live in `semmed-io`.

pub mod equivalence;
pub mod error;
pub mod expand;
pub mod filter;
pub mod grouping;
pub mod mapping;
pub mod reference;
pub mod retirement;
pub mod sink;
pub mod test_support;
pub mod types;

pub use equivalence::{CollapseStats, Collapser, EquivalenceOracle};
pub use error::{CollapseError, CollapseResult, OracleError, OracleResult};
pub use expand::{ExpandStats, Expander};
pub use filter::{DropReason, FilterStats, RecordFilter};
pub use grouping::{group_documents, GroupStats};
pub use reference::{
    RetirementMapping, RetirementRow, SemanticTypeMap, SentenceSource, SentenceTable,
    TerminologyReference, TerminologyRow,
};
pub use retirement::{resolve_retired, ResolveStats};
pub use sink::{DocumentSink, SinkError, SinkResult};
pub use types::{
    AtomicPredication, Document, DocumentEntity, Entity, EntityId, EntityKind, Evidence,
    FieldValue, RawRow, Side,
};

// Re-export the policy so callers need not depend on semmed-config directly
pub use semmed_config::MixedFieldPolicy;
