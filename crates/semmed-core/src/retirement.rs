//! Retired-identifier resolution
//!
//! Records pointing at a retired concept are rewritten to its replacement,
//! matched on identifier *and* semantic type. The replacement needs a name
//! to be rendered, taken from the dataset itself when the replacement already
//! appears there under the same semantic type, and from the terminology
//! reference otherwise. A record whose retired identifier has no named,
//! same-type replacement is dropped.
//!
//! Subjects are resolved first and objects are resolved on the
//! subject-resolved records, so a record retired on both sides must find a
//! replacement for each.

use crate::reference::{RetirementMapping, TerminologyReference};
use crate::types::{AtomicPredication, EntityKind, Side};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Counts reported by [`resolve_retired`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Records with a retired identifier on either side
    pub affected: usize,
    pub replaced_subjects: usize,
    pub replaced_objects: usize,
    /// Affected records that produced no resolved record
    pub dropped: usize,
    pub output: usize,
}

/// Replacement names keyed by (identifier, semantic type)
type ReplacementNames = HashMap<(String, String), String>;

/// Index names for every replacement identifier the records may need
///
/// Dataset entries are inserted before terminology entries and the first
/// insert for a key wins.
fn replacement_names(
    records: &[AtomicPredication],
    retirements: &RetirementMapping,
    terminology: &TerminologyReference,
) -> ReplacementNames {
    let wanted: HashSet<&str> = records
        .iter()
        .flat_map(|r| Side::BOTH.into_iter().map(move |side| r.entity(side)))
        .filter_map(|e| retirements.replacements(&e.id))
        .flatten()
        .map(String::as_str)
        .collect();

    let mut names = ReplacementNames::new();

    for record in records {
        for side in Side::BOTH {
            let entity = record.entity(side);
            if wanted.contains(entity.id.as_str()) {
                names
                    .entry((entity.id.clone(), entity.semantic_type.clone()))
                    .or_insert_with(|| entity.name.clone());
            }
        }
    }

    for (id, semtype, name) in terminology.iter() {
        if wanted.contains(id) {
            names
                .entry((id.to_string(), semtype.to_string()))
                .or_insert_with(|| name.to_string());
        }
    }

    names
}

/// Replace retired identifiers, dropping records that cannot be resolved
///
/// A retired identifier with several named same-type replacements yields one
/// record per replacement, in mapping order. Output order follows input
/// order. Resolving already-resolved output changes nothing.
pub fn resolve_retired(
    records: Vec<AtomicPredication>,
    retirements: &RetirementMapping,
    terminology: &TerminologyReference,
) -> (Vec<AtomicPredication>, ResolveStats) {
    let mut stats = ResolveStats::default();

    let is_affected = |r: &AtomicPredication| {
        retirements.is_retired(&r.subject.id) || retirements.is_retired(&r.object.id)
    };
    if retirements.is_empty() || !records.iter().any(is_affected) {
        stats.output = records.len();
        return (records, stats);
    }

    let names = replacement_names(&records, retirements, terminology);

    let mut output = Vec::with_capacity(records.len());
    for record in records {
        if !is_affected(&record) {
            output.push(record);
            continue;
        }
        stats.affected += 1;

        let subject_resolved = resolve_side(record, Side::Subject, retirements, &names);
        stats.replaced_subjects += subject_resolved.replaced;

        let mut resolved = Vec::new();
        for record in subject_resolved.records {
            let object_resolved = resolve_side(record, Side::Object, retirements, &names);
            stats.replaced_objects += object_resolved.replaced;
            resolved.extend(object_resolved.records);
        }

        if resolved.is_empty() {
            stats.dropped += 1;
        }
        output.extend(resolved);
    }

    stats.output = output.len();
    debug!(
        "Retirement resolution: {} affected, {} subjects and {} objects replaced, {} dropped",
        stats.affected, stats.replaced_subjects, stats.replaced_objects, stats.dropped
    );
    (output, stats)
}

struct SideResolution {
    records: Vec<AtomicPredication>,
    replaced: usize,
}

fn resolve_side(
    record: AtomicPredication,
    side: Side,
    retirements: &RetirementMapping,
    names: &ReplacementNames,
) -> SideResolution {
    let entity = record.entity(side);
    let Some(replacements) = retirements.replacements(&entity.id) else {
        return SideResolution {
            records: vec![record],
            replaced: 0,
        };
    };

    let semantic_type = entity.semantic_type.clone();
    let records: Vec<_> = replacements
        .iter()
        .filter_map(|replacement| {
            let name = names.get(&(replacement.clone(), semantic_type.clone()))?;
            let mut resolved = record.clone();
            let target = resolved.entity_mut(side);
            target.kind = EntityKind::classify(replacement).unwrap_or(EntityKind::Concept);
            target.id = replacement.clone();
            target.name = name.clone();
            Some(resolved)
        })
        .collect();

    if records.is_empty() {
        debug!(
            record = %record.id,
            retired = %record.entity(side).id,
            %side,
            "No named replacement with matching semantic type, dropping record"
        );
    }

    SideResolution {
        replaced: records.len(),
        records,
    }
}
