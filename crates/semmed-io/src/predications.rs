//! Predication table reader
//!
//! The table has twelve columns in fixed order:
//!
//! ```text
//! PREDICATION_ID;SENTENCE_ID;PMID;PREDICATE;
//! SUBJECT_CUI;SUBJECT_NAME;SUBJECT_SEMTYPE;SUBJECT_NOVELTY;
//! OBJECT_CUI;OBJECT_NAME;OBJECT_SEMTYPE;OBJECT_NOVELTY
//! ```
//!
//! Lines with the wrong column count or a non-numeric novelty are skipped
//! with a warning and counted. Only failing to open or read the file is an
//! error.

use crate::error::{SourceError, SourceResult};
use csv::{ReaderBuilder, StringRecord};
use semmed_config::SourcesConfig;
use semmed_core::RawRow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Number of columns of a predication line
pub const PREDICATION_COLUMNS: usize = 12;

/// Counts reported by [`PredicationReader`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: usize,
    pub rows: usize,
    pub skipped: usize,
}

/// Reads raw predication rows from a delimited file
#[derive(Debug, Clone, Copy)]
pub struct PredicationReader {
    delimiter: u8,
    has_header: bool,
}

impl Default for PredicationReader {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_header: true,
        }
    }
}

impl PredicationReader {
    pub fn new(delimiter: char, has_header: bool) -> SourceResult<Self> {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(SourceError::Delimiter(delimiter))?;
        Ok(Self {
            delimiter,
            has_header,
        })
    }

    pub fn from_config(config: &SourcesConfig) -> SourceResult<Self> {
        Self::new(config.delimiter, config.has_header)
    }

    pub fn read_path(&self, path: &Path) -> SourceResult<(Vec<RawRow>, ReadStats)> {
        let file = File::open(path).map_err(|e| SourceError::open(path, e))?;
        self.read(file, path)
    }

    /// Read rows from any reader; `label` names the source in errors and logs
    pub fn read<R: Read>(&self, input: R, label: &Path) -> SourceResult<(Vec<RawRow>, ReadStats)> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(input);

        let mut stats = ReadStats::default();
        let mut rows = Vec::new();

        for result in reader.records() {
            stats.lines += 1;
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(SourceError::read(label, e)),
                Err(e) => {
                    warn!("Skipping unreadable line in {}: {}", label.display(), e);
                    stats.skipped += 1;
                    continue;
                }
            };

            match parse_record(&record) {
                Some(row) => rows.push(row),
                None => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    warn!(
                        "Skipping malformed line {} in {} ({} columns)",
                        line,
                        label.display(),
                        record.len()
                    );
                    stats.skipped += 1;
                }
            }
        }

        stats.rows = rows.len();
        debug!(
            "Read {} predication rows from {} ({} skipped)",
            stats.rows,
            label.display(),
            stats.skipped
        );
        Ok((rows, stats))
    }
}

fn parse_record(record: &StringRecord) -> Option<RawRow> {
    if record.len() != PREDICATION_COLUMNS {
        return None;
    }
    let field = |i: usize| record.get(i).unwrap_or_default().to_string();
    let code = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
    let novelty = |i: usize| record.get(i)?.trim().parse::<u8>().ok();

    Some(RawRow {
        predication_id: code(0),
        sentence_id: code(1),
        citation_id: code(2),
        predicate: code(3),
        subject_ids: field(4),
        subject_names: field(5),
        subject_semtype: code(6),
        subject_novelty: novelty(7)?,
        object_ids: field(8),
        object_names: field(9),
        object_semtype: code(10),
        object_novelty: novelty(11)?,
    })
}
