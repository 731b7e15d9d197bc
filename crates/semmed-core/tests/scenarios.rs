//! End-to-end scenarios over the core steps with in-memory collaborators

use semmed_core::test_support::fixtures::{raw_row, semantic_types};
use semmed_core::test_support::mocks::MockEquivalenceOracle;
use semmed_core::{
    group_documents, resolve_retired, Collapser, Document, Expander, MixedFieldPolicy, RawRow,
    RecordFilter, RetirementMapping, RetirementRow, SentenceTable, TerminologyReference,
    TerminologyRow,
};

async fn run(
    rows: Vec<RawRow>,
    retirements: &RetirementMapping,
    terminology: &TerminologyReference,
    oracle: &MockEquivalenceOracle,
) -> Vec<Document> {
    let types = semantic_types();
    let (rows, _) = RecordFilter::new().apply(rows);
    let (records, _) = Expander::new(&types, MixedFieldPolicy::Expand).expand(rows);
    let (records, _) = resolve_retired(records, retirements, terminology);
    let (records, _) = Collapser::new(1000, 10)
        .unwrap()
        .collapse(records, oracle)
        .await
        .unwrap();
    let sentences: SentenceTable = vec![("s11021926", "FCGR2A and FCGR2B bind CD4.")]
        .into_iter()
        .collect();
    group_documents(records, Some(&sentences)).0
}

#[tokio::test]
async fn fcgr_cd4_row_yields_two_gene_documents() {
    let row = raw_row("11021926", "2212|2213", "FCGR2A|FCGR2B", "C1332714|920", "CD4 gene|CD4");
    let oracle = MockEquivalenceOracle::with_answers(vec![("C1332714", "920")]);

    let documents = run(
        vec![row],
        &RetirementMapping::new(),
        &TerminologyReference::new(),
        &oracle,
    )
    .await;

    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["2212-INTERACTS_WITH-920", "2213-INTERACTS_WITH-920"]);

    let value = serde_json::to_value(&documents[0]).unwrap();
    assert_eq!(value["subject"]["gene"], "2212");
    assert_eq!(value["subject"]["name"], "FCGR2A");
    assert_eq!(value["object"]["gene"], "920");
    assert!(value["object"].get("concept").is_none());
    assert_eq!(value["object"]["semantic_type_name"], "Amino Acid, Peptide, or Protein");
    assert_eq!(value["evidence"][0]["predication_id"], "11021926");
    assert_eq!(value["evidence"][0]["sentence_text"], "FCGR2A and FCGR2B bind CD4.");
    assert_eq!(value["evidence_count"], 1);
    assert_eq!(value["citation_count"], 1);
}

#[tokio::test]
async fn unnamed_replacement_removes_all_records() {
    let rows = vec![
        raw_row("1", "C4082455", "Retired gene", "C0000002", "B"),
        raw_row("2", "C0000003", "A", "C4082455", "Retired gene"),
        raw_row("3", "C0000003", "A", "C0000002", "B"),
    ];
    let retirements = RetirementMapping::from_rows(vec![RetirementRow::new("C4082455", "RB", "C4300557")]);
    let terminology = TerminologyReference::from_rows(vec![TerminologyRow::new("C4300557", "", "gngm")]);

    let documents = run(rows, &retirements, &terminology, &MockEquivalenceOracle::new()).await;

    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["3"]);
}

#[tokio::test]
async fn zero_subject_novelty_yields_no_documents() {
    let mut row = raw_row("5", "C0000001", "A", "C0000002", "B");
    row.subject_novelty = 0;

    let documents = run(
        vec![row],
        &RetirementMapping::new(),
        &TerminologyReference::new(),
        &MockEquivalenceOracle::new(),
    )
    .await;

    assert!(documents.is_empty());
}

#[tokio::test]
async fn evidence_counts_hold_for_repeated_triples() {
    let mut rows = Vec::new();
    for (pid, citation) in [("10", "100"), ("11", "100"), ("12", "101")] {
        let mut row = raw_row(pid, "C0000001", "A", "C0000002", "B");
        row.citation_id = citation.to_string();
        rows.push(row);
    }

    let documents = run(
        rows,
        &RetirementMapping::new(),
        &TerminologyReference::new(),
        &MockEquivalenceOracle::new(),
    )
    .await;

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].evidence_count, 3);
    assert_eq!(documents[0].citation_count, 2);
    assert!(documents[0].citation_count <= documents[0].evidence_count);
}
