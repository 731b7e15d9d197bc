//! File-backed cache of oracle answers
//!
//! The cache file is a JSON object of concept identifier to gene identifier,
//! `null` for identifiers known to have no gene. Only cache misses reach the
//! wrapped oracle, and the file is rewritten after every successful lookup
//! that learned something new. A failed lookup leaves the file untouched.

use async_trait::async_trait;
use semmed_core::{EquivalenceOracle, OracleError, OracleResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

type Entries = BTreeMap<String, Option<String>>;

/// Wraps an oracle with a persistent answer cache
pub struct CachedEquivalenceOracle<O> {
    inner: O,
    path: PathBuf,
    entries: Mutex<Entries>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<O: EquivalenceOracle> CachedEquivalenceOracle<O> {
    /// Open the cache at `path`, starting empty when the file does not exist
    pub fn open(inner: O, path: impl Into<PathBuf>) -> OracleResult<Self> {
        let path = path.into();
        let entries: Entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| OracleError::cache(format!("{}: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| OracleError::cache(format!("{}: {}", path.display(), e)))?
        } else {
            Entries::new()
        };
        info!("Oracle cache {} holds {} answers", path.display(), entries.len());

        Ok(Self {
            inner,
            path,
            entries: Mutex::new(entries),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers answered from the cache so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Identifiers forwarded to the wrapped oracle so far
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn persist(&self, entries: &Entries) -> OracleResult<()> {
        let cache_err = |e: std::io::Error| OracleError::cache(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(cache_err)?;
        }
        let content = serde_json::to_vec_pretty(entries).map_err(|e| OracleError::cache(e.to_string()))?;
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, content).await.map_err(cache_err)?;
        tokio::fs::rename(&staging, &self.path).await.map_err(cache_err)?;
        debug!("Wrote {} answers to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl<O: EquivalenceOracle> EquivalenceOracle for CachedEquivalenceOracle<O> {
    async fn canonical_genes(&self, concept_ids: &[String]) -> OracleResult<HashMap<String, String>> {
        let mut genes = HashMap::new();
        let mut missing = Vec::new();
        {
            let entries = self.entries.lock().await;
            for id in concept_ids {
                match entries.get(id) {
                    Some(Some(gene)) => {
                        genes.insert(id.clone(), gene.clone());
                    }
                    Some(None) => {}
                    None => missing.push(id.clone()),
                }
            }
        }
        self.hits.fetch_add(concept_ids.len() - missing.len(), Ordering::Relaxed);

        if missing.is_empty() {
            return Ok(genes);
        }
        self.misses.fetch_add(missing.len(), Ordering::Relaxed);

        let found = self.inner.canonical_genes(&missing).await?;

        let mut entries = self.entries.lock().await;
        for id in missing {
            let gene = found.get(&id).cloned();
            if let Some(gene) = &gene {
                genes.insert(id.clone(), gene.clone());
            }
            entries.insert(id, gene);
        }
        self.persist(&entries).await?;

        Ok(genes)
    }
}
