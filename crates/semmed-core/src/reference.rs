//! Read-only lookup tables built once per run
//!
//! Nothing here is global: callers load the tables (see `semmed-io`) and
//! pass them into the steps that need them.

use std::collections::{HashMap, HashSet};

/// Relation code marking a retired identifier as deleted without replacement
pub const DELETION_CODE: &str = "DEL";

/// Semantic type abbreviation to full name, e.g. `gngm` to "Gene or Genome"
#[derive(Debug, Clone, Default)]
pub struct SemanticTypeMap {
    names: HashMap<String, String>,
}

impl SemanticTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (abbreviation, full name) pairs; the first pair for an
    /// abbreviation wins
    pub fn from_pairs<I, A, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, N)>,
        A: Into<String>,
        N: Into<String>,
    {
        let mut names = HashMap::new();
        for (abbreviation, name) in pairs {
            names.entry(abbreviation.into()).or_insert_with(|| name.into());
        }
        Self { names }
    }

    pub fn get(&self, abbreviation: &str) -> Option<&str> {
        self.names.get(abbreviation).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row of the retirement reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetirementRow {
    pub retired: String,
    pub relation: String,
    pub replacement: String,
}

impl RetirementRow {
    pub fn new(
        retired: impl Into<String>,
        relation: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            retired: retired.into(),
            relation: relation.into(),
            replacement: replacement.into(),
        }
    }
}

/// Retired concept identifier to its ordered replacements
///
/// An empty replacement list means the identifier was deleted. Replacement
/// chains are flattened at construction, so no replacement is itself a key.
#[derive(Debug, Clone, Default)]
pub struct RetirementMapping {
    replacements: HashMap<String, Vec<String>>,
}

impl RetirementMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from reference rows
    ///
    /// A `DEL` row empties the replacement list of its identifier even when
    /// other rows name replacements for it. A replacement that is itself
    /// retired is followed to its own replacements; cycles resolve to nothing.
    pub fn from_rows(rows: impl IntoIterator<Item = RetirementRow>) -> Self {
        let mut direct: HashMap<String, Vec<String>> = HashMap::new();
        let mut deleted: HashSet<String> = HashSet::new();

        for row in rows {
            let retired = row.retired.trim().to_string();
            if retired.is_empty() {
                continue;
            }
            let targets = direct.entry(retired.clone()).or_default();
            if row.relation.trim() == DELETION_CODE {
                deleted.insert(retired);
                continue;
            }
            let replacement = row.replacement.trim();
            if !replacement.is_empty()
                && replacement != retired
                && !targets.iter().any(|t| t == replacement)
            {
                targets.push(replacement.to_string());
            }
        }

        for id in &deleted {
            if let Some(targets) = direct.get_mut(id) {
                targets.clear();
            }
        }

        let replacements = direct
            .keys()
            .map(|id| {
                let mut resolved = Vec::new();
                let mut visiting = HashSet::new();
                flatten_chain(id, &direct, &mut visiting, &mut resolved);
                (id.clone(), resolved)
            })
            .collect();

        Self { replacements }
    }

    pub fn is_retired(&self, id: &str) -> bool {
        self.replacements.contains_key(id)
    }

    /// Replacements of a retired identifier, `None` when it is not retired
    pub fn replacements(&self, id: &str) -> Option<&[String]> {
        self.replacements.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}

fn flatten_chain(
    id: &str,
    direct: &HashMap<String, Vec<String>>,
    visiting: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if !visiting.insert(id.to_string()) {
        return;
    }
    if let Some(targets) = direct.get(id) {
        for target in targets {
            if direct.contains_key(target) {
                flatten_chain(target, direct, visiting, out);
            } else if !out.contains(target) {
                out.push(target.clone());
            }
        }
    }
}

/// One row of the external terminology: preferred name of an identifier
/// under a semantic type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminologyRow {
    pub identifier: String,
    pub name: String,
    pub semantic_type: String,
}

impl TerminologyRow {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        semantic_type: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            semantic_type: semantic_type.into(),
        }
    }
}

/// (identifier, semantic type) to preferred name, from outside the dataset
#[derive(Debug, Clone, Default)]
pub struct TerminologyReference {
    names: HashMap<(String, String), String>,
}

impl TerminologyReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from terminology rows; rows without a name are skipped and the
    /// first name per key wins
    pub fn from_rows(rows: impl IntoIterator<Item = TerminologyRow>) -> Self {
        let mut names = HashMap::new();
        for row in rows {
            if row.name.trim().is_empty() {
                continue;
            }
            names
                .entry((row.identifier, row.semantic_type))
                .or_insert(row.name);
        }
        Self { names }
    }

    pub fn get(&self, identifier: &str, semantic_type: &str) -> Option<&str> {
        self.names
            .get(&(identifier.to_string(), semantic_type.to_string()))
            .map(String::as_str)
    }

    /// Iterate over `(identifier, semantic type, name)` entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.names
            .iter()
            .map(|((id, semtype), name)| (id.as_str(), semtype.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Source of sentence texts for evidence entries
pub trait SentenceSource: Send + Sync {
    /// Text of a sentence, `None` when unknown
    fn sentence_text(&self, sentence_id: &str) -> Option<&str>;
}

/// In-memory sentence table
#[derive(Debug, Clone, Default)]
pub struct SentenceTable {
    texts: HashMap<String, String>,
}

impl SentenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sentence_id: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(sentence_id.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SentenceTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, text) in iter {
            table.insert(id, text);
        }
        table
    }
}

impl SentenceSource for SentenceTable {
    fn sentence_text(&self, sentence_id: &str) -> Option<&str> {
        self.texts.get(sentence_id).map(String::as_str)
    }
}
