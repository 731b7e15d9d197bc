//! Common test utilities for pipeline tests.

use anyhow::Result;
use semmed_config::SemmedConfig;
use std::path::Path;
use tempfile::TempDir;

pub const PREDICATIONS: &str = "\
PREDICATION_ID;SENTENCE_ID;PMID;PREDICATE;SUBJECT_CUI;SUBJECT_NAME;SUBJECT_SEMTYPE;SUBJECT_NOVELTY;OBJECT_CUI;OBJECT_NAME;OBJECT_SEMTYPE;OBJECT_NOVELTY
11021926;501;10880000;INTERACTS_WITH;2212|2213;FCGR2A|FCGR2B;gngm;1;C1332714|920;CD4 gene|CD4;gngm;1
2001;502;10880001;TREATS;C0004057;Aspirin;phsu;1;C0030193;Pain;sosy;1
2002;503;10880002;TREATS;C0004057;Aspirin;phsu;1;C0030193;Pain;sosy;1
2003;504;10880002;TREATS;C0004057;Aspirin;phsu;0;C0030193;Pain;sosy;1
2004;505;10880003;CAUSES;C4082455;Retired thing;gngm;1;C0030193;Pain;sosy;1
2005;506;10880004;CAUSES;C0000001;Old name;gngm;1;C0030193;Pain;sosy;1
2006;507;10880005;TREATS;C0004057;Aspirin;phsu;1;C0030193 was seen;Pain;sosy;1
broken line
";

pub const SEMANTIC_TYPES: &str = "\
gngm|T028|Gene or Genome
phsu|T121|Pharmacologic Substance
sosy|T184|Sign or Symptom
";

pub const RETIREMENTS: &str = "\
C4082455|ENG|RB||C4300557|
C0000001|ENG|SY||C0000010|
";

pub const TERMINOLOGY: &str = "\
C4300557||gngm
C0000010|New name|gngm
";

pub const SENTENCES: &str = "\
501|10880000|ti|1|FCGR2A and FCGR2B bind CD4.
502|10880001|ab|2|Aspirin relieves pain.
";

/// Write the fixture tables into a temp directory and return a config
/// pointing at them.
///
/// Returns the temp directory (which must be kept alive) and the config.
pub fn write_fixture_tables() -> Result<(TempDir, SemmedConfig)> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();
    let write = |name: &str, content: &str| -> Result<std::path::PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    };

    let mut config = SemmedConfig::default();
    config.sources.predications = Some(write("predications.csv", PREDICATIONS)?);
    config.sources.semantic_types = Some(write("SemanticTypes.txt", SEMANTIC_TYPES)?);
    config.sources.retirements = Some(write("MRCUI.RRF", RETIREMENTS)?);
    config.sources.terminology = Some(write("terminology.txt", TERMINOLOGY)?);
    config.sources.sentences = Some(write("sentences.txt", SENTENCES)?);
    config.output.path = Some(dir.join("out").join("documents.jsonl"));
    Ok((temp_dir, config))
}

/// Read a JSON-lines file into values.
pub fn read_json_lines(path: &Path) -> Result<Vec<serde_json::Value>> {
    std::fs::read_to_string(path)?
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}
