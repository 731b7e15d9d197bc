//! Loaders for the pipe-delimited reference tables
//!
//! All tables are headerless, `|`-delimited and unquoted. Lines with too few
//! columns are skipped and counted in a debug log.

use crate::error::{SourceError, SourceResult};
use csv::{ReaderBuilder, StringRecord};
use semmed_core::{
    RetirementMapping, RetirementRow, SemanticTypeMap, SentenceTable, TerminologyReference,
    TerminologyRow,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const TABLE_DELIMITER: u8 = b'|';

/// `sentence id|pmid|section|number|text`; the text may itself contain `|`
const SENTENCE_TEXT_COLUMN: usize = 4;

/// Read every record of a pipe table, passing those with at least
/// `min_columns` columns to `row`
fn read_table<R, T, F>(input: R, label: &Path, min_columns: usize, mut row: F) -> SourceResult<Vec<T>>
where
    R: Read,
    F: FnMut(&StringRecord) -> Option<T>,
{
    let mut reader = ReaderBuilder::new()
        .delimiter(TABLE_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(input);

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(SourceError::read(label, e)),
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        match (record.len() >= min_columns).then(|| row(&record)).flatten() {
            Some(item) => out.push(item),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} lines of {}", skipped, label.display());
    }
    Ok(out)
}

fn open(path: &Path) -> SourceResult<File> {
    File::open(path).map_err(|e| SourceError::open(path, e))
}

fn column(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default().trim()
}

/// `abbreviation|id|full name`
pub fn load_semantic_types(path: &Path) -> SourceResult<SemanticTypeMap> {
    read_semantic_types(open(path)?, path)
}

pub fn read_semantic_types<R: Read>(input: R, label: &Path) -> SourceResult<SemanticTypeMap> {
    let pairs = read_table(input, label, 3, |r| {
        Some((column(r, 0).to_string(), column(r, 2).to_string()))
    })?;
    let map = SemanticTypeMap::from_pairs(pairs);
    info!("Loaded {} semantic types from {}", map.len(), label.display());
    Ok(map)
}

/// `retired|_|relation|_|replacement|_`
pub fn load_retirements(path: &Path) -> SourceResult<RetirementMapping> {
    read_retirements(open(path)?, path)
}

pub fn read_retirements<R: Read>(input: R, label: &Path) -> SourceResult<RetirementMapping> {
    let rows = read_table(input, label, 5, |r| {
        Some(RetirementRow::new(column(r, 0), column(r, 2), column(r, 4)))
    })?;
    let mapping = RetirementMapping::from_rows(rows);
    info!("Loaded {} retired identifiers from {}", mapping.len(), label.display());
    Ok(mapping)
}

/// `identifier|preferred name|semantic type`
pub fn load_terminology(path: &Path) -> SourceResult<TerminologyReference> {
    read_terminology(open(path)?, path)
}

pub fn read_terminology<R: Read>(input: R, label: &Path) -> SourceResult<TerminologyReference> {
    let rows = read_table(input, label, 3, |r| {
        Some(TerminologyRow::new(column(r, 0), column(r, 1), column(r, 2)))
    })?;
    let terminology = TerminologyReference::from_rows(rows);
    info!("Loaded {} terminology names from {}", terminology.len(), label.display());
    Ok(terminology)
}

/// Sentence texts keyed by the id in the first column
pub fn load_sentences(path: &Path) -> SourceResult<SentenceTable> {
    read_sentences(open(path)?, path)
}

pub fn read_sentences<R: Read>(input: R, label: &Path) -> SourceResult<SentenceTable> {
    let pairs = read_table(input, label, SENTENCE_TEXT_COLUMN + 1, |r| {
        let id = column(r, 0);
        let text = r.iter().skip(SENTENCE_TEXT_COLUMN).collect::<Vec<_>>().join("|");
        (!id.is_empty()).then(|| (id.to_string(), text.trim().to_string()))
    })?;
    let table: SentenceTable = pairs.into_iter().collect();
    info!("Loaded {} sentences from {}", table.len(), label.display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semmed_core::SentenceSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn inline() -> &'static Path {
        Path::new("inline")
    }

    #[test]
    fn test_semantic_types_use_first_and_third_column() {
        let data = "gngm|T028|Gene or Genome\naapp|T116|Amino Acid, Peptide, or Protein\nbroken\n";

        let map = read_semantic_types(data.as_bytes(), inline()).unwrap();

        assert_eq!(map.get("gngm"), Some("Gene or Genome"));
        assert_eq!(map.get("aapp"), Some("Amino Acid, Peptide, or Protein"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_retirements_honour_deletion() {
        let data = "C0000001|ENG|SY|||\
                    \nC0000001|ENG|SY||C0000010|\
                    \nC0000002|ENG|DEL||C0000020|\
                    \nC4082455|ENG|RB||C4300557|\n";

        let mapping = read_retirements(data.as_bytes(), inline()).unwrap();

        assert_eq!(mapping.replacements("C0000001").unwrap(), &["C0000010".to_string()]);
        assert!(mapping.replacements("C0000002").unwrap().is_empty());
        assert_eq!(mapping.replacements("C4082455").unwrap(), &["C4300557".to_string()]);
    }

    #[test]
    fn test_terminology_columns() {
        let data = "C0000010|Replacement gene|gngm\nC4300557||gngm\n";

        let terminology = read_terminology(data.as_bytes(), inline()).unwrap();

        assert_eq!(terminology.get("C0000010", "gngm"), Some("Replacement gene"));
        assert_eq!(terminology.get("C4300557", "gngm"), None);
    }

    #[test]
    fn test_sentences_keep_quotes_and_skip_short_lines() {
        let data = "s1|9000|ti|1|He said \"CD4 binds FCGR2A\".\ns2|plain\n";

        let table = read_sentences(data.as_bytes(), inline()).unwrap();

        assert_eq!(table.sentence_text("s1"), Some("He said \"CD4 binds FCGR2A\"."));
        assert_eq!(table.sentence_text("s2"), None);
    }

    #[test]
    fn test_sentence_text_keeps_inner_pipes() {
        let data = "s1|9000|ti|1|A|B ratio rises.\ns2|9001|ab|2|CD4|CD8|CD3 panel\n";

        let table = read_sentences(data.as_bytes(), inline()).unwrap();

        assert_eq!(table.sentence_text("s1"), Some("A|B ratio rises."));
        assert_eq!(table.sentence_text("s2"), Some("CD4|CD8|CD3 panel"));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dsyn|T047|Disease or Syndrome").unwrap();

        let map = load_semantic_types(file.path()).unwrap();
        assert_eq!(map.get("dsyn"), Some("Disease or Syndrome"));

        let err = load_semantic_types(Path::new("/nonexistent/SemanticTypes.txt")).unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
