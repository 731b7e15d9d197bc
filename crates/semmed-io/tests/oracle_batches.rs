//! Collapsing through the HTTP oracle with several batches in flight

use semmed_config::OracleConfig;
use semmed_core::{Collapser, CollapseError, OracleError};
use semmed_io::{CachedEquivalenceOracle, HttpEquivalenceOracle};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> OracleConfig {
    OracleConfig {
        url: format!("{}/get_normalized_nodes", server.uri()),
        batch_size: 2,
        max_concurrent: 2,
        ..OracleConfig::default()
    }
}

fn concept_ids(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("C{i:07}")).collect()
}

#[tokio::test]
async fn lookup_sends_one_request_per_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_normalized_nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UMLS:C0000001": {"equivalent_identifiers": [{"identifier": "NCBIGene:1"}]},
            "UMLS:C0000004": {"equivalent_identifiers": [{"identifier": "NCBIGene:4"}]}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let config = config(&server);
    let oracle = HttpEquivalenceOracle::from_config(&config).unwrap();
    let collapser = Collapser::from_config(&config).unwrap();

    let genes = collapser.lookup(&oracle, &concept_ids(5)).await.unwrap();

    // every batch gets the same body; answers merge by identifier
    assert_eq!(genes.len(), 2);
    assert_eq!(genes.get("C0000004").map(String::as_str), Some("4"));
}

#[tokio::test]
async fn server_error_fails_the_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = config(&server);
    let oracle = HttpEquivalenceOracle::from_config(&config).unwrap();

    let err = Collapser::from_config(&config)
        .unwrap()
        .lookup(&oracle, &concept_ids(3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CollapseError::Batch {
            source: OracleError::Status { status: 500, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn cached_oracle_skips_known_identifiers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UMLS:C0000001": {"equivalent_identifiers": [{"identifier": "NCBIGene:1"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let mut config = config(&server);
    config.batch_size = 10;
    let oracle = CachedEquivalenceOracle::open(
        HttpEquivalenceOracle::from_config(&config).unwrap(),
        temp.path().join("oracle.json"),
    )
    .unwrap();
    let collapser = Collapser::from_config(&config).unwrap();

    let first = collapser.lookup(&oracle, &concept_ids(2)).await.unwrap();
    let second = collapser.lookup(&oracle, &concept_ids(2)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(oracle.hits(), 2);
}
