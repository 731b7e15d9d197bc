//! Record and document types shared by every pipeline step

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Separator of multi-valued identifier and name fields
pub const ID_DELIMITER: char = '|';

/// Leading marker of concept identifiers
pub const CONCEPT_MARKER: char = 'C';

/// Name placeholder upstream writes for a missing sub-value
pub const ABSENT_NAME: &str = "None";

/// One predication row as read from the source table
///
/// Identifier and name fields are kept raw (possibly `|`-joined); splitting
/// them is the expander's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub predication_id: String,
    pub sentence_id: String,
    pub citation_id: String,
    pub predicate: String,
    pub subject_ids: String,
    pub subject_names: String,
    pub subject_semtype: String,
    pub subject_novelty: u8,
    pub object_ids: String,
    pub object_names: String,
    pub object_semtype: String,
    pub object_novelty: u8,
}

/// Identifier namespace of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// `C` followed by digits
    Concept,
    /// Digits only
    Gene,
}

impl EntityKind {
    /// Classify an identifier token by shape, `None` when it has neither
    pub fn classify(token: &str) -> Option<Self> {
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if let Some(rest) = token.strip_prefix(CONCEPT_MARKER) {
            is_digits(rest).then_some(Self::Concept)
        } else {
            is_digits(token).then_some(Self::Gene)
        }
    }

    /// Key used for the identifier in emitted documents
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Gene => "gene",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One side of an atomic predication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    /// Semantic type abbreviation, e.g. `gngm`
    pub semantic_type: String,
    /// Full semantic type name; `None` when the abbreviation has no mapping
    pub semantic_type_name: Option<String>,
    pub novelty: u8,
}

/// Which side of a predication an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Subject,
    Object,
}

impl Side {
    /// Both sides, subject first
    pub const BOTH: [Side; 2] = [Side::Subject, Side::Object];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => f.write_str("subject"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// One fully expanded subject-predicate-object fact
///
/// Several atomic predications may share a `predication_id` when they were
/// expanded from the same raw row; `id` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicPredication {
    /// Expansion id: the bare predication id or `predication_id_N`
    pub id: String,
    /// Id of the raw row this fact came from
    pub predication_id: String,
    pub citation_id: String,
    pub sentence_id: String,
    pub predicate: String,
    pub subject: Entity,
    pub object: Entity,
    /// The raw subject field held several tokens
    pub subject_was_multi: bool,
    /// The raw object field held several tokens
    pub object_was_multi: bool,
}

impl AtomicPredication {
    pub fn entity(&self, side: Side) -> &Entity {
        match side {
            Side::Subject => &self.subject,
            Side::Object => &self.object,
        }
    }

    pub fn entity_mut(&mut self, side: Side) -> &mut Entity {
        match side {
            Side::Subject => &mut self.subject,
            Side::Object => &mut self.object,
        }
    }

    pub fn was_multi(&self, side: Side) -> bool {
        match side {
            Side::Subject => self.subject_was_multi,
            Side::Object => self.object_was_multi,
        }
    }

    /// Grouping key: (subject id, predicate, object id)
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.subject.id, &self.predicate, &self.object.id)
    }
}

/// A field that is a single value or a deduplicated set of values
///
/// Grouped documents keep every distinct name or semantic type seen across
/// the group. Consumers must handle both shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Scalar(T),
    Set(BTreeSet<T>),
}

impl<T: Ord> FieldValue<T> {
    /// Collapse values into a scalar when exactly one is distinct
    ///
    /// Returns `None` for an empty input.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Option<Self> {
        let mut set: BTreeSet<T> = values.into_iter().collect();
        match set.len() {
            0 => None,
            1 => set.pop_first().map(Self::Scalar),
            _ => Some(Self::Set(set)),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// All values, in sorted order
    pub fn values(&self) -> Vec<&T> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::Set(values) => values.iter().collect(),
        }
    }
}

/// Identifier of a document entity, serialized as `{"concept": ..}` or `{"gene": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityId {
    Concept(String),
    Gene(String),
}

impl EntityId {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        match kind {
            EntityKind::Concept => Self::Concept(id.into()),
            EntityKind::Gene => Self::Gene(id.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Concept(id) | Self::Gene(id) => id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Concept(_) => EntityKind::Concept,
            Self::Gene(_) => EntityKind::Gene,
        }
    }
}

/// Aggregated entity of an emitted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntity {
    #[serde(flatten)]
    pub id: EntityId,
    pub name: FieldValue<String>,
    pub semantic_type_abbreviation: FieldValue<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_type_name: Option<FieldValue<String>>,
    pub novelty: u8,
}

/// One supporting mention of a document's triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    /// Origin predication id, suffixed `_N` when the document holds
    /// several facts expanded from the same row
    pub predication_id: String,
    pub citation_id: String,
    pub sentence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_text: Option<String>,
}

/// The emitted unit, one per (subject, predicate, object) group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub predicate: String,
    pub subject: DocumentEntity,
    pub object: DocumentEntity,
    pub evidence: Vec<Evidence>,
    /// Distinct citation ids among the evidence
    pub citation_count: usize,
    /// Number of evidence entries
    pub evidence_count: usize,
}
