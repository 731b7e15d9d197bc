//! In-memory mocks of the I/O seams
//!
//! - [`MockEquivalenceOracle`]: fixed concept to gene answers, records every
//!   batch it receives and can be told to fail
//! - [`MemorySink`]: collects written documents
//!
//! Both are cheap to clone; clones share state so a test can keep a handle
//! for assertions after handing one to the pipeline.

use crate::equivalence::EquivalenceOracle;
use crate::error::{OracleError, OracleResult};
use crate::sink::{DocumentSink, SinkError, SinkResult};
use crate::types::Document;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct OracleState {
    answers: HashMap<String, String>,
    batches: Vec<Vec<String>>,
    fail_with: Option<String>,
}

/// Oracle answering from a fixed concept to gene table
#[derive(Debug, Clone, Default)]
pub struct MockEquivalenceOracle {
    state: Arc<Mutex<OracleState>>,
}

impl MockEquivalenceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle preloaded with (concept, gene) answers
    pub fn with_answers<I, C, G>(answers: I) -> Self
    where
        I: IntoIterator<Item = (C, G)>,
        C: Into<String>,
        G: Into<String>,
    {
        let oracle = Self::new();
        for (concept, gene) in answers {
            oracle.set_answer(concept, gene);
        }
        oracle
    }

    pub fn set_answer(&self, concept: impl Into<String>, gene: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .answers
            .insert(concept.into(), gene.into());
    }

    /// Make every following call fail with a request error
    pub fn set_failure(&self, message: &str) {
        self.state.lock().unwrap().fail_with = Some(message.to_string());
    }

    /// Every batch received so far, in call order
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().batches.len()
    }
}

#[async_trait]
impl EquivalenceOracle for MockEquivalenceOracle {
    async fn canonical_genes(&self, concept_ids: &[String]) -> OracleResult<HashMap<String, String>> {
        let mut state = self.state.lock().unwrap();
        state.batches.push(concept_ids.to_vec());

        if let Some(message) = &state.fail_with {
            return Err(OracleError::request(message.clone()));
        }

        Ok(concept_ids
            .iter()
            .filter_map(|id| state.answers.get(id).map(|gene| (id.clone(), gene.clone())))
            .collect())
    }
}

#[derive(Debug, Default)]
struct SinkState {
    documents: Vec<Document>,
    flushes: usize,
    fail_writes: bool,
}

/// Sink that keeps documents in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().unwrap().documents.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().unwrap().flushes
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write(&self, document: &Document) -> SinkResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(SinkError::write_failed("memory sink configured to fail"));
        }
        state.documents.push(document.clone());
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        self.state.lock().unwrap().flushes += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MemorySink"
    }
}
