//! Catalog seed → extraction → evaluation record.

mod common;

use common::fixtures::{Workspace, tender_pages};
use serde_json::json;
use tenderlens::catalog::{CatalogError, QuestionCatalog, read_seed};
use tenderlens::sink::{AnswerRecord, EvaluationSink, JsonlSink, ScoringRequest};

fn seed() -> serde_json::Value {
    json!([
        {"q_id": "Q10", "prompt_json": {"prompt": "Score {q_id}"}, "is_active": 0},
        {"q_id": "Q2", "prompt_json": "{\"prompt\": \"Score {q_id} under {header}:\\n{answer_text}\"}"},
        {"q_id": "", "prompt_json": {}},
        {"q_id": "Q1", "prompt_json": "Plain instructions", "search_label": "Criterion"}
    ])
}

#[test]
fn test_seed_import_persists_in_question_order() {
    let ws = Workspace::new();
    let seed_path = ws.path("seed.json");
    std::fs::write(&seed_path, seed().to_string()).unwrap();
    let catalog_path = ws.path("data").join("questions.json");

    let mut catalog = QuestionCatalog::load(&catalog_path).unwrap();
    let report = catalog.import_blank(&read_seed(&seed_path).unwrap()).unwrap();
    catalog.save(&catalog_path).unwrap();

    assert_eq!((report.created, report.updated, report.skipped), (3, 0, 1));

    let reloaded = QuestionCatalog::load(&catalog_path).unwrap();
    let ids: Vec<&str> = reloaded.ordered().iter().map(|q| q.q_id.as_str()).collect();
    assert_eq!(ids, vec!["Q1", "Q2", "Q10"]);
    let active: Vec<&str> = reloaded.active().iter().map(|q| q.q_id.as_str()).collect();
    assert_eq!(active, vec!["Q1", "Q2"]);
    assert_eq!(reloaded.get("Q1").unwrap().prompt_text(), "Plain instructions");

    let mut again = reloaded.clone();
    assert!(matches!(
        again.import_blank(&read_seed(&seed_path).unwrap()),
        Err(CatalogError::NotBlank { count: 3 })
    ));
    let report = again.import(&read_seed(&seed_path).unwrap());
    assert_eq!((report.created, report.updated, report.skipped), (0, 3, 1));
}

#[tokio::test]
async fn test_catalog_question_drives_extraction_and_sink() {
    let ws = Workspace::new();
    let mut catalog = QuestionCatalog::new();
    catalog.import(seed().as_array().unwrap());
    let question = catalog.require("Q2").unwrap();

    let pdf = ws.pdf("applicant-42.pdf", &tender_pages());
    let extractor = ws.extractor(ws.cache(), None);
    let outcome = extractor
        .extract_path(&pdf, &question.search_spec(), Some(42))
        .await;
    let result = outcome.into_found().expect("Q2 section");

    let record = AnswerRecord::from_result(42, &question.q_id, &result);
    let request = ScoringRequest::build(record.clone(), question).unwrap();
    assert!(request.prompt.starts_with("Score Q2 under Criterion 2 Delivery:\n"));
    assert!(request.prompt.contains("two regional hubs"));

    let sink = JsonlSink::new(ws.path("answers.jsonl"));
    sink.record(record.clone()).await.unwrap();
    let line = std::fs::read_to_string(sink.path()).unwrap();
    let stored: AnswerRecord = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(stored, record);
}

#[test]
fn test_unknown_question() {
    let catalog = QuestionCatalog::new();
    assert!(matches!(
        catalog.require("Q1"),
        Err(CatalogError::UnknownQuestion { .. })
    ));
}
