//! Index mapping for emitted documents
//!
//! Field names follow the serialized [`crate::types::Document`]. Identifier
//! and code fields are keywords behind a lowercase normalizer so lookups are
//! case-insensitive; names and sentences are full text.

use serde_json::{json, Value};

/// Normalizer referenced by every keyword field
pub const KEYWORD_NORMALIZER: &str = "keyword_lowercase_normalizer";

fn keyword() -> Value {
    json!({ "type": "keyword", "normalizer": KEYWORD_NORMALIZER })
}

fn entity_properties() -> Value {
    json!({
        "properties": {
            "concept": keyword(),
            "gene": keyword(),
            "name": { "type": "text" },
            "semantic_type_abbreviation": keyword(),
            "semantic_type_name": { "type": "text" },
            "novelty": { "type": "integer" }
        }
    })
}

/// Mapping of the document index, including the normalizer definition
pub fn index_mapping() -> Value {
    json!({
        "settings": {
            "analysis": {
                "normalizer": {
                    KEYWORD_NORMALIZER: {
                        "type": "custom",
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "predicate": keyword(),
                "subject": entity_properties(),
                "object": entity_properties(),
                "evidence": {
                    "properties": {
                        "predication_id": { "type": "keyword" },
                        "citation_id": { "type": "keyword" },
                        "sentence_id": { "type": "keyword" },
                        "sentence_text": { "type": "text" }
                    }
                },
                "citation_count": { "type": "integer" },
                "evidence_count": { "type": "integer" }
            }
        }
    })
}
