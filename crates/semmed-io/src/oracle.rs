//! Node-normalization HTTP oracle
//!
//! Request:
//!
//! ```json
//! {"curies": ["UMLS:C1332714", "UMLS:C0000001"]}
//! ```
//!
//! Response, one entry per curie, `null` when the service does not know it:
//!
//! ```json
//! {
//!   "UMLS:C1332714": {"equivalent_identifiers": [{"identifier": "NCBIGene:920"}]},
//!   "UMLS:C0000001": null
//! }
//! ```
//!
//! The first equivalent identifier in the gene namespace is the canonical
//! gene; both namespace tags are stripped before returning.

use async_trait::async_trait;
use reqwest::Client;
use semmed_config::OracleConfig;
use semmed_core::{EquivalenceOracle, OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Longest response body kept in a status error
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct NormalizeRequest {
    curies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NormalizedNode {
    #[serde(default)]
    equivalent_identifiers: Vec<EquivalentIdentifier>,
}

#[derive(Debug, Deserialize)]
struct EquivalentIdentifier {
    identifier: String,
}

/// Oracle backed by a node-normalization web service
#[derive(Debug, Clone)]
pub struct HttpEquivalenceOracle {
    client: Client,
    url: String,
    concept_prefix: String,
    gene_prefix: String,
}

impl HttpEquivalenceOracle {
    /// Create an oracle from a prepared client
    #[must_use]
    pub fn new(client: Client, config: &OracleConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            concept_prefix: config.concept_prefix.clone(),
            gene_prefix: config.gene_prefix.clone(),
        }
    }

    /// Create an oracle with a client using the configured request timeout
    pub fn from_config(config: &OracleConfig) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::request(e.to_string()))?;
        Ok(Self::new(client, config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn canonical_gene(&self, node: NormalizedNode) -> Option<String> {
        node.equivalent_identifiers.into_iter().find_map(|eq| {
            eq.identifier
                .strip_prefix(&self.gene_prefix)
                .map(str::to_string)
        })
    }
}

#[async_trait]
impl EquivalenceOracle for HttpEquivalenceOracle {
    async fn canonical_genes(&self, concept_ids: &[String]) -> OracleResult<HashMap<String, String>> {
        let request = NormalizeRequest {
            curies: concept_ids
                .iter()
                .map(|id| format!("{}{}", self.concept_prefix, id))
                .collect(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let nodes: HashMap<String, Option<NormalizedNode>> = response
            .json()
            .await
            .map_err(|e| OracleError::decode(e.to_string()))?;

        let genes: HashMap<String, String> = nodes
            .into_iter()
            .filter_map(|(curie, node)| {
                let id = curie.strip_prefix(&self.concept_prefix)?.to_string();
                let gene = self.canonical_gene(node?)?;
                Some((id, gene))
            })
            .collect();

        debug!(
            "Oracle answered {} of {} identifiers with a gene",
            genes.len(),
            concept_ids.len()
        );
        Ok(genes)
    }
}
