//! Loading the lookup tables and the oracle a run needs

use anyhow::{Context, Result};
use semmed_config::{OracleConfig, SourcesConfig};
use semmed_core::{
    EquivalenceOracle, RetirementMapping, SemanticTypeMap, SentenceTable, TerminologyReference,
};
use semmed_io::{
    load_retirements, load_semantic_types, load_sentences, load_terminology,
    CachedEquivalenceOracle, HttpEquivalenceOracle,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Read-only tables shared by every step of a run
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub semantic_types: SemanticTypeMap,
    pub retirements: RetirementMapping,
    pub terminology: TerminologyReference,
    /// Sentence texts; evidence carries no text without them
    pub sentences: Option<SentenceTable>,
}

impl ReferenceData {
    /// Load every configured table; unconfigured tables are left empty
    pub fn load(sources: &SourcesConfig) -> Result<Self> {
        fn optional<T: Default>(
            path: Option<&Path>,
            table: &str,
            load: impl FnOnce(&Path) -> semmed_io::SourceResult<T>,
        ) -> Result<T> {
            match path {
                Some(path) => load(path)
                    .with_context(|| format!("Failed to load {} table '{}'", table, path.display())),
                None => {
                    warn!("No {} table configured", table);
                    Ok(T::default())
                }
            }
        }

        let semantic_types = optional(
            sources.semantic_types.as_deref(),
            "semantic type",
            load_semantic_types,
        )?;
        let retirements = optional(sources.retirements.as_deref(), "retirement", load_retirements)?;
        let terminology = optional(sources.terminology.as_deref(), "terminology", load_terminology)?;
        let sentences = sources
            .sentences
            .as_deref()
            .map(|path| {
                load_sentences(path)
                    .with_context(|| format!("Failed to load sentence table '{}'", path.display()))
            })
            .transpose()?;

        Ok(Self {
            semantic_types,
            retirements,
            terminology,
            sentences,
        })
    }
}

/// Build the configured oracle, `None` when the oracle is disabled
pub fn build_oracle(config: &OracleConfig) -> Result<Option<Arc<dyn EquivalenceOracle>>> {
    if !config.enabled {
        info!("Equivalence oracle disabled");
        return Ok(None);
    }

    let http = HttpEquivalenceOracle::from_config(config).context("Failed to build HTTP client")?;
    info!("Using equivalence oracle at {}", http.url());

    let oracle: Arc<dyn EquivalenceOracle> = match &config.cache_path {
        Some(path) => Arc::new(
            CachedEquivalenceOracle::open(http, path)
                .with_context(|| format!("Failed to open oracle cache '{}'", path.display()))?,
        ),
        None => Arc::new(http),
    };
    Ok(Some(oracle))
}
