//! Record filter: the first cleaning pass over raw rows
//!
//! Rows are dropped silently and counted. Subject identifiers are trusted;
//! object identifier fields are checked against a character class because
//! free text is known to leak into that column in some source snapshots.

use crate::types::RawRow;
use regex::Regex;
use tracing::debug;

/// Allowed shape of a raw object identifier field
pub const OBJECT_ID_PATTERN: &str = r"^[C0-9|]+$";

/// Why a raw row was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Subject or object novelty is zero
    ZeroNovelty,
    /// Object identifier field contains characters outside `C`, digits, `|`
    MalformedObjectId,
}

/// Counts reported by [`RecordFilter::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    pub kept: usize,
    pub zero_novelty: usize,
    pub malformed_object_id: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.zero_novelty + self.malformed_object_id
    }
}

/// Drops structurally invalid and zero-novelty rows
#[derive(Debug, Clone)]
pub struct RecordFilter {
    object_ids: Regex,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFilter {
    pub fn new() -> Self {
        Self {
            object_ids: Regex::new(OBJECT_ID_PATTERN).expect("valid regex"),
        }
    }

    /// Check one row, returning the reason it must be dropped
    pub fn check(&self, row: &RawRow) -> Result<(), DropReason> {
        if row.subject_novelty == 0 || row.object_novelty == 0 {
            return Err(DropReason::ZeroNovelty);
        }
        if !self.object_ids.is_match(row.object_ids.trim()) {
            return Err(DropReason::MalformedObjectId);
        }
        Ok(())
    }

    /// Keep the rows that pass [`RecordFilter::check`], in input order
    pub fn apply(&self, rows: impl IntoIterator<Item = RawRow>) -> (Vec<RawRow>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::new();

        for row in rows {
            stats.input += 1;
            match self.check(&row) {
                Ok(()) => kept.push(row),
                Err(DropReason::ZeroNovelty) => stats.zero_novelty += 1,
                Err(DropReason::MalformedObjectId) => {
                    debug!(
                        predication_id = %row.predication_id,
                        object_ids = %row.object_ids,
                        "Dropping row with malformed object identifier"
                    );
                    stats.malformed_object_id += 1;
                }
            }
        }

        stats.kept = kept.len();
        (kept, stats)
    }
}
