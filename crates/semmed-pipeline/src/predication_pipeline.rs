//! Predication Pipeline Orchestrator
//!
//! ## Phases
//!
//! 1. **Filter**: [`RecordFilter`]
//! 2. **Expand**: [`Expander`]
//! 3. **Resolve**: [`resolve_retired`]
//! 4. **Collapse**: [`Collapser`] against the injected [`EquivalenceOracle`]
//! 5. **Group**: [`group_documents`]
//!
//! Phases run strictly in order, each consuming the previous record set.
//! Only phase 4 performs I/O and only phase 4 can fail.

use crate::reference::ReferenceData;
use anyhow::{Context, Result};
use semmed_config::SemmedConfig;
use semmed_core::{
    group_documents, resolve_retired, CollapseStats, Collapser, Document, DocumentSink,
    EquivalenceOracle, ExpandStats, Expander, FilterStats, GroupStats, MixedFieldPolicy, RawRow,
    RecordFilter, ResolveStats, SentenceSource,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline setup errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Collapsing is enabled but no oracle was supplied
    #[error("Equivalence collapsing is enabled but no oracle is configured")]
    MissingOracle,

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for pipeline behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How multi-valued sides holding a concept identifier are expanded
    pub mixed_fields: MixedFieldPolicy,
    /// Run phase 4; when false no oracle is needed
    pub collapse: bool,
    /// Identifiers per oracle request
    pub batch_size: usize,
    /// Oracle requests in flight
    pub max_concurrent: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mixed_fields: MixedFieldPolicy::default(),
            collapse: true,
            batch_size: Collapser::DEFAULT_BATCH_SIZE,
            max_concurrent: Collapser::DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &SemmedConfig) -> Self {
        Self {
            mixed_fields: config.expansion.mixed_fields,
            collapse: config.oracle.enabled,
            batch_size: config.oracle.batch_size,
            max_concurrent: config.oracle.max_concurrent,
        }
    }
}

/// Per-phase counts and durations of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    pub filter: FilterStats,
    pub expand: ExpandStats,
    pub resolve: ResolveStats,
    /// `None` when collapsing was skipped
    pub collapse: Option<CollapseStats>,
    pub group: GroupStats,
    pub filter_ms: u64,
    pub expand_ms: u64,
    pub resolve_ms: u64,
    pub collapse_ms: u64,
    pub group_ms: u64,
    /// Time spent handing documents to a sink, zero for [`PredicationPipeline::run`]
    pub write_ms: u64,
    pub total_ms: u64,
}

impl PipelineMetrics {
    pub fn documents(&self) -> usize {
        self.group.documents
    }
}

/// Documents of a run with its metrics
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub documents: Vec<Document>,
    pub metrics: PipelineMetrics,
}

/// The pipeline orchestrator
///
/// ```text
/// PredicationPipeline
///   ├─> RecordFilter          (Phase 1)
///   ├─> Expander              (Phase 2, SemanticTypeMap)
///   ├─> resolve_retired       (Phase 3, RetirementMapping + TerminologyReference)
///   ├─> Collapser             (Phase 4, EquivalenceOracle)
///   └─> group_documents       (Phase 5, SentenceTable)
/// ```
pub struct PredicationPipeline {
    reference: Arc<ReferenceData>,
    oracle: Option<Arc<dyn EquivalenceOracle>>,
    filter: RecordFilter,
    collapser: Collapser,
    config: PipelineConfig,
}

impl PredicationPipeline {
    /// Create a pipeline with the default config
    pub fn new(
        reference: ReferenceData,
        oracle: Option<Arc<dyn EquivalenceOracle>>,
    ) -> std::result::Result<Self, PipelineError> {
        Self::with_config(reference, oracle, PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(
        reference: ReferenceData,
        oracle: Option<Arc<dyn EquivalenceOracle>>,
        config: PipelineConfig,
    ) -> std::result::Result<Self, PipelineError> {
        if config.collapse && oracle.is_none() {
            return Err(PipelineError::MissingOracle);
        }
        let collapser = Collapser::new(config.batch_size, config.max_concurrent)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            reference: Arc::new(reference),
            oracle,
            filter: RecordFilter::new(),
            collapser,
            config,
        })
    }

    /// Create a pipeline from the application configuration
    pub fn from_config(
        reference: ReferenceData,
        oracle: Option<Arc<dyn EquivalenceOracle>>,
        config: &SemmedConfig,
    ) -> std::result::Result<Self, PipelineError> {
        Self::with_config(reference, oracle, PipelineConfig::from_config(config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Run all phases over `rows` and return the documents
    ///
    /// Malformed rows and unresolvable identifiers are dropped and counted.
    /// Only a failed oracle batch aborts the run.
    pub async fn run(&self, rows: Vec<RawRow>) -> Result<PipelineOutput> {
        let start = Instant::now();
        let mut metrics = PipelineMetrics::default();
        info!("Processing {} predication rows", rows.len());

        // Phase 1: Filter
        let phase_start = Instant::now();
        let (rows, filter_stats) = self.filter.apply(rows);
        metrics.filter_ms = phase_start.elapsed().as_millis() as u64;
        debug!(
            "Phase 1: Kept {} rows ({} zero novelty, {} malformed object ids)",
            filter_stats.kept, filter_stats.zero_novelty, filter_stats.malformed_object_id
        );
        metrics.filter = filter_stats;

        // Phase 2: Expand
        let phase_start = Instant::now();
        let expander = Expander::new(&self.reference.semantic_types, self.config.mixed_fields);
        let (records, expand_stats) = expander.expand(rows);
        metrics.expand_ms = phase_start.elapsed().as_millis() as u64;
        debug!(
            "Phase 2: Expanded into {} records ({} policy)",
            expand_stats.records, self.config.mixed_fields
        );
        metrics.expand = expand_stats;

        // Phase 3: Resolve retired identifiers
        let phase_start = Instant::now();
        let (records, resolve_stats) = resolve_retired(
            records,
            &self.reference.retirements,
            &self.reference.terminology,
        );
        metrics.resolve_ms = phase_start.elapsed().as_millis() as u64;
        debug!(
            "Phase 3: {} records referenced retired identifiers, {} dropped",
            resolve_stats.affected, resolve_stats.dropped
        );
        metrics.resolve = resolve_stats;

        // Phase 4: Collapse (if enabled)
        let phase_start = Instant::now();
        let records = match (&self.oracle, self.config.collapse) {
            (Some(oracle), true) => {
                let (records, collapse_stats) = self
                    .collapser
                    .collapse(records, oracle.as_ref())
                    .await
                    .context("Phase 4: Equivalence collapsing failed")?;
                metrics.collapse = Some(collapse_stats);
                records
            }
            _ => {
                debug!("Phase 4: Collapsing skipped (disabled in config)");
                records
            }
        };
        metrics.collapse_ms = phase_start.elapsed().as_millis() as u64;

        // Phase 5: Group
        let phase_start = Instant::now();
        let sentences = self
            .reference
            .sentences
            .as_ref()
            .map(|table| table as &dyn SentenceSource);
        let (documents, group_stats) = group_documents(records, sentences);
        metrics.group_ms = phase_start.elapsed().as_millis() as u64;
        metrics.group = group_stats;

        metrics.total_ms = start.elapsed().as_millis() as u64;
        info!(
            "Produced {} documents in {}ms (P1:{}, P2:{}, P3:{}, P4:{}, P5:{})",
            metrics.group.documents,
            metrics.total_ms,
            metrics.filter_ms,
            metrics.expand_ms,
            metrics.resolve_ms,
            metrics.collapse_ms,
            metrics.group_ms
        );

        Ok(PipelineOutput { documents, metrics })
    }

    /// Run all phases and write every document to `sink`, flushing at the end
    pub async fn run_into_sink(
        &self,
        rows: Vec<RawRow>,
        sink: &dyn DocumentSink,
    ) -> Result<PipelineMetrics> {
        let PipelineOutput {
            documents,
            mut metrics,
        } = self.run(rows).await?;

        let write_start = Instant::now();
        for document in &documents {
            sink.write(document).await.with_context(|| {
                format!("Failed to write document '{}' to {}", document.id, sink.name())
            })?;
        }
        sink.flush()
            .await
            .with_context(|| format!("Failed to flush {}", sink.name()))?;
        metrics.write_ms = write_start.elapsed().as_millis() as u64;
        metrics.total_ms += metrics.write_ms;

        info!("Wrote {} documents to {}", documents.len(), sink.name());
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semmed_core::test_support::fixtures::{raw_row, semantic_types};
    use semmed_core::test_support::mocks::{MemorySink, MockEquivalenceOracle};

    fn reference() -> ReferenceData {
        ReferenceData {
            semantic_types: semantic_types(),
            ..ReferenceData::default()
        }
    }

    fn scenario_row() -> RawRow {
        raw_row("11021926", "2212|2213", "FCGR2A|FCGR2B", "C1332714|920", "CD4 gene|CD4")
    }

    #[test]
    fn test_collapse_requires_oracle() {
        let result = PredicationPipeline::new(reference(), None);
        assert!(matches!(result, Err(PipelineError::MissingOracle)));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = PipelineConfig {
            collapse: false,
            batch_size: 0,
            ..PipelineConfig::default()
        };
        let result = PredicationPipeline::with_config(reference(), None, config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_follows_application_config() {
        let mut app = SemmedConfig::default();
        app.oracle.enabled = false;
        app.oracle.batch_size = 50;
        app.expansion.mixed_fields = MixedFieldPolicy::FirstConcept;

        let config = PipelineConfig::from_config(&app);

        assert!(!config.collapse);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.mixed_fields, MixedFieldPolicy::FirstConcept);
    }

    #[tokio::test]
    async fn test_run_collapses_scenario() {
        let oracle = MockEquivalenceOracle::with_answers(vec![("C1332714", "920")]);
        let pipeline = PredicationPipeline::new(reference(), Some(Arc::new(oracle))).unwrap();

        let output = pipeline.run(vec![scenario_row()]).await.unwrap();

        let ids: Vec<_> = output.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2212-INTERACTS_WITH-920", "2213-INTERACTS_WITH-920"]);
        assert_eq!(output.metrics.expand.records, 4);
        assert_eq!(output.metrics.collapse.map(|c| c.collapsed), Some(2));
        assert_eq!(output.metrics.documents(), 2);
    }

    #[tokio::test]
    async fn test_run_without_collapse_keeps_concept_records() {
        let config = PipelineConfig {
            collapse: false,
            ..PipelineConfig::default()
        };
        let pipeline = PredicationPipeline::with_config(reference(), None, config).unwrap();

        let output = pipeline.run(vec![scenario_row()]).await.unwrap();

        assert_eq!(output.documents.len(), 4);
        assert!(output.metrics.collapse.is_none());
    }

    #[tokio::test]
    async fn test_oracle_failure_names_the_phase() {
        let oracle = MockEquivalenceOracle::new();
        oracle.set_failure("connection reset");
        let pipeline = PredicationPipeline::new(reference(), Some(Arc::new(oracle))).unwrap();

        let err = pipeline.run(vec![scenario_row()]).await.unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Phase 4"));
        assert!(message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_run_into_sink_writes_and_flushes() {
        let oracle = MockEquivalenceOracle::with_answers(vec![("C1332714", "920")]);
        let pipeline = PredicationPipeline::new(reference(), Some(Arc::new(oracle))).unwrap();
        let sink = MemorySink::new();

        let metrics = pipeline.run_into_sink(vec![scenario_row()], &sink).await.unwrap();

        assert_eq!(sink.documents().len(), 2);
        assert_eq!(sink.flush_count(), 1);
        assert_eq!(metrics.documents(), 2);
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let config = PipelineConfig {
            collapse: false,
            ..PipelineConfig::default()
        };
        let pipeline = PredicationPipeline::with_config(reference(), None, config).unwrap();
        let sink = MemorySink::new();
        sink.set_fail_writes(true);

        let err = pipeline.run_into_sink(vec![scenario_row()], &sink).await.unwrap_err();

        assert!(format!("{err:#}").contains("MemorySink"));
    }
}
