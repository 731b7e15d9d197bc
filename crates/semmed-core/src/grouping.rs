//! Document grouping
//!
//! Atomic predications sharing (subject id, predicate, object id) become one
//! [`Document`]. Groups come out in sorted triple order and members are
//! sorted before evidence is built, so documents depend only on the record
//! set and never on arrival order.

use crate::reference::SentenceSource;
use crate::types::{
    AtomicPredication, Document, DocumentEntity, EntityId, Evidence, FieldValue, Side,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Counts reported by [`group_documents`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub records: usize,
    pub documents: usize,
    /// Documents with more than one evidence entry
    pub multi_evidence: usize,
    pub largest_group: usize,
    /// Evidence entries that received a sentence text
    pub sentence_texts: usize,
}

type Triple = (String, String, String);

/// Group atomic predications into documents
pub fn group_documents(
    records: Vec<AtomicPredication>,
    sentences: Option<&dyn SentenceSource>,
) -> (Vec<Document>, GroupStats) {
    let mut stats = GroupStats {
        records: records.len(),
        ..Default::default()
    };

    // Records still sharing an origin (retirement fan-out) must not all
    // claim the bare predication id
    let mut origins: HashMap<String, usize> = HashMap::new();
    for record in &records {
        *origins.entry(record.predication_id.clone()).or_default() += 1;
    }

    let mut groups: BTreeMap<Triple, Vec<AtomicPredication>> = BTreeMap::new();
    for record in records {
        let (subject, predicate, object) = record.triple();
        let key = (subject.to_string(), predicate.to_string(), object.to_string());
        groups.entry(key).or_default().push(record);
    }

    let mut documents = Vec::with_capacity(groups.len());
    for ((subject, predicate, object), mut members) in groups {
        members.sort_by(compare_members);
        stats.largest_group = stats.largest_group.max(members.len());
        if members.len() > 1 {
            stats.multi_evidence += 1;
        }

        let evidence = build_evidence(&members, sentences);
        stats.sentence_texts += evidence.iter().filter(|e| e.sentence_text.is_some()).count();

        let id = match members.as_slice() {
            [only]
                if !only.subject_was_multi
                    && !only.object_was_multi
                    && origins.get(&only.predication_id) == Some(&1) =>
            {
                only.predication_id.clone()
            }
            _ => format!("{subject}-{predicate}-{object}"),
        };
        let citations: HashSet<&str> = members.iter().map(|m| m.citation_id.as_str()).collect();

        documents.push(Document {
            id,
            predicate,
            subject: aggregate_entity(&members, Side::Subject),
            object: aggregate_entity(&members, Side::Object),
            citation_count: citations.len(),
            evidence_count: evidence.len(),
            evidence,
        });
    }

    stats.documents = documents.len();
    debug!(
        "Grouped {} records into {} documents ({} with several evidence entries)",
        stats.records, stats.documents, stats.multi_evidence
    );
    (documents, stats)
}

/// Predication id descending, then expansion id
///
/// Members share subject and object ids, so their entity kinds never differ.
fn compare_members(a: &AtomicPredication, b: &AtomicPredication) -> Ordering {
    compare_predication_ids(&b.predication_id, &a.predication_id)
        // length first keeps `_2` before `_10` for a shared prefix
        .then_with(|| a.id.len().cmp(&b.id.len()))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_predication_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn build_evidence(
    members: &[AtomicPredication],
    sentences: Option<&dyn SentenceSource>,
) -> Vec<Evidence> {
    let mut shared: HashMap<&str, usize> = HashMap::new();
    for member in members {
        *shared.entry(member.predication_id.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    members
        .iter()
        .map(|member| {
            let origin = member.predication_id.as_str();
            let predication_id = if shared.get(origin).copied().unwrap_or(0) > 1 {
                let n = seen.entry(origin).or_default();
                *n += 1;
                format!("{origin}_{n}")
            } else {
                origin.to_string()
            };
            Evidence {
                predication_id,
                citation_id: member.citation_id.clone(),
                sentence_id: member.sentence_id.clone(),
                sentence_text: sentences
                    .and_then(|s| s.sentence_text(&member.sentence_id))
                    .map(str::to_string),
            }
        })
        .collect()
}

fn aggregate_entity(members: &[AtomicPredication], side: Side) -> DocumentEntity {
    let first = members[0].entity(side);
    let entities = || members.iter().map(move |m| m.entity(side));

    DocumentEntity {
        id: EntityId::new(first.kind, first.id.clone()),
        name: FieldValue::from_values(entities().map(|e| e.name.clone()))
            .unwrap_or_else(|| FieldValue::Scalar(first.name.clone())),
        semantic_type_abbreviation: FieldValue::from_values(
            entities().map(|e| e.semantic_type.clone()),
        )
        .unwrap_or_else(|| FieldValue::Scalar(first.semantic_type.clone())),
        semantic_type_name: FieldValue::from_values(
            entities().filter_map(|e| e.semantic_type_name.clone()),
        ),
        novelty: entities().map(|e| e.novelty).max().unwrap_or(first.novelty),
    }
}
