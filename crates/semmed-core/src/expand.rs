//! Multi-value expansion of raw rows into atomic predications
//!
//! A raw identifier field may hold several `|`-joined tokens with a parallel
//! `|`-joined name field. Each side is split into (identifier, name) pairs,
//! then the cartesian product of the two sides becomes the atomic records:
//!
//! ```text
//! subjects 2212|2213 x objects C1332714|920
//!   -> 11021926_1  2212 C1332714
//!   -> 11021926_2  2212 920
//!   -> 11021926_3  2213 C1332714
//!   -> 11021926_4  2213 920
//! ```
//!
//! The subject is the outer loop. Sequence suffixes depend on that order,
//! and downstream ids depend on the suffixes.

use crate::reference::SemanticTypeMap;
use crate::types::{
    AtomicPredication, Entity, EntityKind, RawRow, ABSENT_NAME, CONCEPT_MARKER, ID_DELIMITER,
};
use semmed_config::MixedFieldPolicy;
use tracing::{debug, trace};

/// Counts reported by [`Expander::expand`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandStats {
    pub rows: usize,
    pub records: usize,
    /// Rows whose tokens were all dropped on at least one side
    pub empty_rows: usize,
    /// Identifier tokens dropped as empty, unnamed or of unknown shape
    pub dropped_tokens: usize,
    /// Rows with at least one multi-valued side
    pub multi_valued_rows: usize,
}

/// Expanded tokens of one side of a raw row
#[derive(Debug)]
struct SideTokens {
    entities: Vec<Entity>,
    was_multi: bool,
    dropped: usize,
}

/// Splits raw rows into atomic predications
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    semantic_types: &'a SemanticTypeMap,
    policy: MixedFieldPolicy,
}

impl<'a> Expander<'a> {
    pub fn new(semantic_types: &'a SemanticTypeMap, policy: MixedFieldPolicy) -> Self {
        Self {
            semantic_types,
            policy,
        }
    }

    /// Expand every row, keeping row order and per-row combination order
    pub fn expand(&self, rows: Vec<RawRow>) -> (Vec<AtomicPredication>, ExpandStats) {
        let mut stats = ExpandStats::default();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            stats.rows += 1;
            let (expanded, dropped_tokens, multi) = self.expand_counted(row);
            stats.dropped_tokens += dropped_tokens;
            if multi {
                stats.multi_valued_rows += 1;
            }
            if expanded.is_empty() {
                stats.empty_rows += 1;
            }
            records.extend(expanded);
        }

        stats.records = records.len();
        debug!(
            "Expanded {} rows into {} records ({} multi-valued, {} empty, {} tokens dropped)",
            stats.rows, stats.records, stats.multi_valued_rows, stats.empty_rows, stats.dropped_tokens
        );
        (records, stats)
    }

    /// Expand one row into its atomic predications
    pub fn expand_row(&self, row: RawRow) -> Vec<AtomicPredication> {
        self.expand_counted(row).0
    }

    fn expand_counted(&self, row: RawRow) -> (Vec<AtomicPredication>, usize, bool) {
        let subjects = self.side_tokens(
            &row.subject_ids,
            &row.subject_names,
            &row.subject_semtype,
            row.subject_novelty,
        );
        let objects = self.side_tokens(
            &row.object_ids,
            &row.object_names,
            &row.object_semtype,
            row.object_novelty,
        );
        let dropped = subjects.dropped + objects.dropped;
        let multi = subjects.was_multi || objects.was_multi;

        let total = subjects.entities.len() * objects.entities.len();
        let mut records = Vec::with_capacity(total);
        let mut sequence = 0usize;

        for subject in &subjects.entities {
            for object in &objects.entities {
                sequence += 1;
                let id = if total == 1 {
                    row.predication_id.clone()
                } else {
                    format!("{}_{}", row.predication_id, sequence)
                };
                records.push(AtomicPredication {
                    id,
                    predication_id: row.predication_id.clone(),
                    citation_id: row.citation_id.clone(),
                    sentence_id: row.sentence_id.clone(),
                    predicate: row.predicate.clone(),
                    subject: subject.clone(),
                    object: object.clone(),
                    subject_was_multi: subjects.was_multi,
                    object_was_multi: objects.was_multi,
                });
            }
        }

        (records, dropped, multi)
    }

    fn side_tokens(&self, ids: &str, names: &str, semtype: &str, novelty: u8) -> SideTokens {
        let was_multi = ids.contains(ID_DELIMITER);
        let mut pairs: Vec<(&str, Option<&str>)> = {
            let mut names = names.split(ID_DELIMITER);
            ids.split(ID_DELIMITER)
                .map(|id| (id.trim(), names.next()))
                .collect()
        };

        if self.policy == MixedFieldPolicy::FirstConcept && was_multi && ids.contains(CONCEPT_MARKER)
        {
            pairs.truncate(1);
        }

        let semantic_type_name = self.semantic_types.get(semtype).map(str::to_string);
        let mut dropped = 0;
        let mut entities = Vec::with_capacity(pairs.len());

        for (id, name) in pairs {
            let name = name.map(str::trim).filter(|n| !n.is_empty() && *n != ABSENT_NAME);
            let (Some(name), Some(kind)) = (name, EntityKind::classify(id)) else {
                trace!(id, "Dropping identifier token without usable name or shape");
                dropped += 1;
                continue;
            };
            entities.push(Entity {
                id: id.to_string(),
                kind,
                name: name.to_string(),
                semantic_type: semtype.to_string(),
                semantic_type_name: semantic_type_name.clone(),
                novelty,
            });
        }

        SideTokens {
            entities,
            was_multi,
            dropped,
        }
    }
}
