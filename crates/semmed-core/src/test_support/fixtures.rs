//! Record builders for tests

use crate::reference::SemanticTypeMap;
use crate::types::{AtomicPredication, Entity, EntityKind, RawRow};

/// Raw row with novelty 1 on both sides, semantic types `gngm`/`aapp`,
/// predicate `INTERACTS_WITH` and citation `1`
pub fn raw_row(
    predication_id: &str,
    subject_ids: &str,
    subject_names: &str,
    object_ids: &str,
    object_names: &str,
) -> RawRow {
    RawRow {
        predication_id: predication_id.to_string(),
        sentence_id: format!("s{predication_id}"),
        citation_id: "1".to_string(),
        predicate: "INTERACTS_WITH".to_string(),
        subject_ids: subject_ids.to_string(),
        subject_names: subject_names.to_string(),
        subject_semtype: "gngm".to_string(),
        subject_novelty: 1,
        object_ids: object_ids.to_string(),
        object_names: object_names.to_string(),
        object_semtype: "aapp".to_string(),
        object_novelty: 1,
    }
}

/// Semantic types used by the fixtures
pub fn semantic_types() -> SemanticTypeMap {
    SemanticTypeMap::from_pairs(vec![
        ("gngm", "Gene or Genome"),
        ("aapp", "Amino Acid, Peptide, or Protein"),
        ("dsyn", "Disease or Syndrome"),
    ])
}

/// Entity whose kind is inferred from the identifier shape
pub fn entity(id: &str, name: &str, semantic_type: &str) -> Entity {
    Entity {
        id: id.to_string(),
        kind: EntityKind::classify(id).unwrap_or(EntityKind::Concept),
        name: name.to_string(),
        semantic_type: semantic_type.to_string(),
        semantic_type_name: None,
        novelty: 1,
    }
}

/// Single-valued atomic predication (`id == predication_id`)
pub fn atomic(
    predication_id: &str,
    subject: Entity,
    predicate: &str,
    object: Entity,
) -> AtomicPredication {
    AtomicPredication {
        id: predication_id.to_string(),
        predication_id: predication_id.to_string(),
        citation_id: "1".to_string(),
        sentence_id: format!("s{predication_id}"),
        predicate: predicate.to_string(),
        subject,
        object,
        subject_was_multi: false,
        object_was_multi: false,
    }
}
