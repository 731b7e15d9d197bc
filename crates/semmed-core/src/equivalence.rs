//! Equivalence collapsing
//!
//! Expanding a multi-valued side can produce two records for the same gene:
//! one through a concept identifier and one through the gene identifier the
//! concept normalizes to. An external oracle maps concept identifiers to
//! canonical gene identifiers; a concept record is dropped when its gene is
//! already present on the same side of a sibling record (same origin
//! predication id).
//!
//! Only concept identifiers on multi-valued sides are looked up. Lookups run
//! in fixed-size batches with bounded parallelism; a failed batch fails the
//! whole step.

use crate::error::{CollapseError, CollapseResult, OracleResult};
use crate::types::{AtomicPredication, EntityKind, Side};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use semmed_config::OracleConfig;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// External identifier-normalization service
#[async_trait]
pub trait EquivalenceOracle: Send + Sync {
    /// Canonical gene identifiers for a batch of bare concept identifiers
    ///
    /// Identifiers without a known gene equivalent are left out of the map.
    async fn canonical_genes(&self, concept_ids: &[String]) -> OracleResult<HashMap<String, String>>;
}

#[async_trait]
impl<T: EquivalenceOracle + ?Sized> EquivalenceOracle for std::sync::Arc<T> {
    async fn canonical_genes(&self, concept_ids: &[String]) -> OracleResult<HashMap<String, String>> {
        (**self).canonical_genes(concept_ids).await
    }
}

/// Counts reported by [`Collapser::collapse`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseStats {
    pub subject_candidates: usize,
    pub object_candidates: usize,
    /// Distinct identifiers sent to the oracle
    pub queried: usize,
    pub batches: usize,
    /// Queried identifiers with a gene equivalent
    pub equivalences: usize,
    /// Records removed as duplicates
    pub collapsed: usize,
    pub output: usize,
}

/// Removes expansion duplicates confirmed by an [`EquivalenceOracle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collapser {
    batch_size: usize,
    max_concurrent: usize,
}

impl Collapser {
    /// Default identifiers per oracle request
    pub const DEFAULT_BATCH_SIZE: usize = 1000;
    /// Default requests in flight
    pub const DEFAULT_MAX_CONCURRENT: usize = 10;

    pub fn new(batch_size: usize, max_concurrent: usize) -> CollapseResult<Self> {
        if batch_size == 0 || max_concurrent == 0 {
            return Err(CollapseError::InvalidConfig(format!(
                "batch_size ({batch_size}) and max_concurrent ({max_concurrent}) must be at least 1"
            )));
        }
        Ok(Self {
            batch_size,
            max_concurrent,
        })
    }

    pub fn from_config(config: &OracleConfig) -> CollapseResult<Self> {
        Self::new(config.batch_size, config.max_concurrent)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Distinct candidate concept identifiers per side
    pub fn candidates(records: &[AtomicPredication]) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut subjects = BTreeSet::new();
        let mut objects = BTreeSet::new();
        for record in records {
            for side in Side::BOTH {
                if is_candidate(record, side) {
                    let id = record.entity(side).id.clone();
                    match side {
                        Side::Subject => subjects.insert(id),
                        Side::Object => objects.insert(id),
                    };
                }
            }
        }
        (subjects, objects)
    }

    /// Query the oracle for `ids` in batches, at most `max_concurrent` at once
    ///
    /// The first failed batch aborts the lookup; outstanding batches are
    /// dropped.
    pub async fn lookup(
        &self,
        oracle: &dyn EquivalenceOracle,
        ids: &[String],
    ) -> CollapseResult<HashMap<String, String>> {
        let requested: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let answers: Vec<HashMap<String, String>> = stream::iter(ids.chunks(self.batch_size).enumerate())
            .map(|(index, batch)| async move {
                debug!("Oracle batch {} ({} identifiers)", index, batch.len());
                oracle
                    .canonical_genes(batch)
                    .await
                    .map_err(|source| CollapseError::Batch {
                        batch: index,
                        size: batch.len(),
                        source,
                    })
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        Ok(answers
            .into_iter()
            .flatten()
            .filter(|(id, _)| requested.contains(id.as_str()))
            .collect())
    }

    /// Drop candidate records whose canonical gene a sibling already carries
    pub async fn collapse(
        &self,
        records: Vec<AtomicPredication>,
        oracle: &dyn EquivalenceOracle,
    ) -> CollapseResult<(Vec<AtomicPredication>, CollapseStats)> {
        let (subject_ids, object_ids) = Self::candidates(&records);
        let mut stats = CollapseStats {
            subject_candidates: subject_ids.len(),
            object_candidates: object_ids.len(),
            ..Default::default()
        };

        let queried: Vec<String> = subject_ids.union(&object_ids).cloned().collect();
        if queried.is_empty() {
            debug!("No equivalence candidates, skipping oracle");
            stats.output = records.len();
            return Ok((records, stats));
        }

        stats.queried = queried.len();
        stats.batches = queried.len().div_ceil(self.batch_size);
        info!(
            "Looking up {} identifiers in {} batches (max {} concurrent)",
            stats.queried, stats.batches, self.max_concurrent
        );

        let genes = self.lookup(oracle, &queried).await?;
        stats.equivalences = genes.len();

        let side_genes = |ids: &BTreeSet<String>| -> HashMap<String, String> {
            ids.iter()
                .filter_map(|id| genes.get(id).map(|gene| (id.clone(), gene.clone())))
                .collect()
        };
        let subject_genes = side_genes(&subject_ids);
        let object_genes = side_genes(&object_ids);

        let keep = redundancy_mask(&records, &subject_genes, &object_genes);
        let input = records.len();
        let output: Vec<_> = records
            .into_iter()
            .zip(keep)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();

        stats.output = output.len();
        stats.collapsed = input - output.len();
        info!(
            "Collapsed {} records ({} equivalences found)",
            stats.collapsed, stats.equivalences
        );
        Ok((output, stats))
    }
}

fn is_candidate(record: &AtomicPredication, side: Side) -> bool {
    record.was_multi(side) && record.entity(side).kind == EntityKind::Concept
}

/// `true` for every record to keep
fn redundancy_mask(
    records: &[AtomicPredication],
    subject_genes: &HashMap<String, String>,
    object_genes: &HashMap<String, String>,
) -> Vec<bool> {
    let present: HashSet<(&str, Side, &str)> = records
        .iter()
        .flat_map(|r| {
            Side::BOTH.into_iter().filter_map(move |side| {
                let entity = r.entity(side);
                (entity.kind == EntityKind::Gene)
                    .then_some((r.predication_id.as_str(), side, entity.id.as_str()))
            })
        })
        .collect();

    records
        .iter()
        .map(|record| {
            !Side::BOTH.into_iter().any(|side| {
                if !is_candidate(record, side) {
                    return false;
                }
                let genes = match side {
                    Side::Subject => subject_genes,
                    Side::Object => object_genes,
                };
                genes.get(&record.entity(side).id).is_some_and(|gene| {
                    present.contains(&(record.predication_id.as_str(), side, gene.as_str()))
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OracleError, OracleResult};
    use crate::expand::Expander;
    use crate::test_support::fixtures::{atomic, entity, raw_row, semantic_types};
    use crate::test_support::mocks::MockEquivalenceOracle;
    use semmed_config::MixedFieldPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn scenario_records() -> Vec<AtomicPredication> {
        let types = semantic_types();
        let row = raw_row("11021926", "2212|2213", "FCGR2A|FCGR2B", "C1332714|920", "CD4 gene|CD4");
        Expander::new(&types, MixedFieldPolicy::Expand).expand_row(row)
    }

    #[test]
    fn test_rejects_zero_settings() {
        assert!(matches!(Collapser::new(0, 10), Err(CollapseError::InvalidConfig(_))));
        assert!(matches!(Collapser::new(10, 0), Err(CollapseError::InvalidConfig(_))));
        let collapser = Collapser::from_config(&OracleConfig::default()).unwrap();
        assert_eq!(collapser.batch_size(), Collapser::DEFAULT_BATCH_SIZE);
        assert_eq!(collapser.max_concurrent(), Collapser::DEFAULT_MAX_CONCURRENT);
    }

    #[tokio::test]
    async fn test_scenario_collapses_to_gene_records() {
        let oracle = MockEquivalenceOracle::with_answers(vec![("C1332714", "920")]);
        let collapser = Collapser::new(1000, 10).unwrap();

        let (records, stats) = collapser.collapse(scenario_records(), &oracle).await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["11021926_2", "11021926_4"]);
        assert!(records.iter().all(|r| r.object.id == "920"));
        assert_eq!(stats.object_candidates, 1);
        assert_eq!(stats.subject_candidates, 0);
        assert_eq!(stats.queried, 1);
        assert_eq!(stats.collapsed, 2);
        assert_eq!(oracle.batches(), vec![vec!["C1332714".to_string()]]);
    }

    #[tokio::test]
    async fn test_concept_without_equivalent_is_kept() {
        let oracle = MockEquivalenceOracle::new();
        let collapser = Collapser::new(1000, 10).unwrap();

        let (records, stats) = collapser.collapse(scenario_records(), &oracle).await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(stats.equivalences, 0);
        assert_eq!(stats.collapsed, 0);
    }

    #[tokio::test]
    async fn test_gene_must_belong_to_same_predication() {
        let mut concept = atomic("1", entity("2212", "FCGR2A", "gngm"), "INTERACTS_WITH", entity("C1332714", "CD4 gene", "gngm"));
        concept.object_was_multi = true;
        let other_row = atomic("2", entity("2212", "FCGR2A", "gngm"), "INTERACTS_WITH", entity("920", "CD4", "gngm"));
        let oracle = MockEquivalenceOracle::with_answers(vec![("C1332714", "920")]);

        let (records, stats) = Collapser::new(1000, 10)
            .unwrap()
            .collapse(vec![concept, other_row], &oracle)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(stats.collapsed, 0);
    }

    #[tokio::test]
    async fn test_single_valued_sides_skip_oracle() {
        let record = atomic("1", entity("C0000001", "A", "gngm"), "P", entity("C0000002", "B", "gngm"));
        let oracle = MockEquivalenceOracle::new();

        let (records, stats) = Collapser::new(1000, 10)
            .unwrap()
            .collapse(vec![record], &oracle)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(stats.queried, 0);
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_batches_each_id_once() {
        let ids: Vec<String> = (0..25).map(|i| format!("C{i:07}")).collect();
        let oracle = MockEquivalenceOracle::new();

        Collapser::new(10, 2).unwrap().lookup(&oracle, &ids).await.unwrap();

        let mut batches = oracle.batches();
        batches.sort_by_key(|b| b.len());
        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 10, 10]);
        let mut seen: Vec<String> = batches.into_iter().flatten().collect();
        seen.sort();
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn test_failed_batch_fails_collapse() {
        let oracle = MockEquivalenceOracle::new();
        oracle.set_failure("connection refused");

        let err = Collapser::new(1000, 10)
            .unwrap()
            .collapse(scenario_records(), &oracle)
            .await
            .unwrap_err();

        match err {
            CollapseError::Batch { batch, size, source } => {
                assert_eq!(batch, 0);
                assert_eq!(size, 1);
                assert!(matches!(source, OracleError::Request(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Sleeps per batch and records the highest number of calls in flight
    struct SlowOracle {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl EquivalenceOracle for SlowOracle {
        async fn canonical_genes(&self, _ids: &[String]) -> OracleResult<HashMap<String, String>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_lookup_bounds_concurrency() {
        let oracle = SlowOracle {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let ids: Vec<String> = (0..40).map(|i| format!("C{i:07}")).collect();

        Collapser::new(4, 3).unwrap().lookup(&oracle, &ids).await.unwrap();

        let peak = oracle.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded limit");
        assert!(peak > 1, "batches never overlapped");
    }
}
