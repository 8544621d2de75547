//! Integration tests for the kudos-rp push handler
//!
//! Tests cover:
//! - Happy path: rows appended in the fixed shape, record stamped as reported
//! - Malformed envelopes/payloads and absent records resolve to no-ops
//! - Sink failure is suppressed: 200 to the bus, `reported_at` stays null
//! - Redelivery after a successful append does not duplicate rows

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use kudos_common::db::feedback::{
    apply_classification, create_feedback, get_feedback, FeedbackRecord,
};
use kudos_common::error::Error;
use kudos_common::events::FeedbackClassified;
use kudos_rp::sheets::ReportSink;
use kudos_rp::{build_router, report, AppState};

/// Sink that records every appended batch
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<Vec<Value>>>>,
}

impl RecordingSink {
    fn batches(&self) -> Vec<Vec<Vec<Value>>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn append_rows(&self, rows: &[Vec<Value>]) -> kudos_common::Result<()> {
        self.batches.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}

/// Sink that always fails
struct FailingSink;

#[async_trait]
impl ReportSink for FailingSink {
    async fn append_rows(&self, _rows: &[Vec<Value>]) -> kudos_common::Result<()> {
        Err(Error::Dependency("report sink unavailable".to_string()))
    }
}

async fn setup_state(sink: Arc<dyn ReportSink>) -> (AppState, SqlitePool) {
    let db = kudos_common::db::init_memory_database()
        .await
        .expect("Should create in-memory store");
    (AppState::new(db.clone(), sink), db)
}

async fn seed_classified_record(db: &SqlitePool, text: &str, score: f64, magnitude: f64) -> Uuid {
    let record = FeedbackRecord::new(text.to_string());
    create_feedback(db, &record).await.unwrap();
    assert!(apply_classification(db, record.guid, score, magnitude)
        .await
        .unwrap());
    record.guid
}

/// Build the push-envelope body the bus would deliver
fn envelope_body(payload: &Value) -> Vec<u8> {
    let data = base64::engine::general_purpose::STANDARD.encode(payload.to_string());
    json!({
        "message": { "data": data, "messageId": "1" },
        "subscription": "feedback-classified-push"
    })
    .to_string()
    .into_bytes()
}

fn classified_body(guid: Uuid) -> Vec<u8> {
    envelope_body(&serde_json::to_value(FeedbackClassified::new(guid)).unwrap())
}

#[tokio::test]
async fn happy_path_appends_rows_and_stamps_record() {
    let sink = Arc::new(RecordingSink::default());
    let (state, db) = setup_state(sink.clone()).await;
    let guid = seed_classified_record(&db, "Great service!", 0.8, 0.9).await;

    let app = build_router(state);
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(classified_body(guid)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    let rows = &batches[0];
    assert_eq!(rows[0], vec![json!("feedback"), json!("Great service!")]);
    assert_eq!(rows[2], vec![json!("sentimentScore"), json!(0.8)]);
    assert_eq!(rows[3], vec![json!("sentimentMagnitude"), json!(0.9)]);
    assert_eq!(rows[4], vec![json!("version"), json!("v1")]);

    let record = get_feedback(&db, guid).await.unwrap().unwrap();
    assert!(record.reported_at.is_some());
}

#[tokio::test]
async fn unclassified_record_reports_state_at_consume_time() {
    // Events are pointers, not snapshots: whatever the record holds when the
    // delivery arrives is what lands in the report
    let sink = Arc::new(RecordingSink::default());
    let (state, db) = setup_state(sink.clone()).await;

    let record = FeedbackRecord::new("early delivery".to_string());
    create_feedback(&db, &record).await.unwrap();

    let ack = report::handle_push(&state, &classified_body(record.guid)).await;
    assert!(ack.is_completed());

    let rows = &sink.batches()[0];
    assert_eq!(rows[2], vec![json!("sentimentScore"), json!(-1.0)]);
}

#[tokio::test]
async fn garbage_body_is_ignored_with_200() {
    let sink = Arc::new(RecordingSink::default());
    let (state, _db) = setup_state(sink.clone()).await;

    let ack = report::handle_push(&state, b"not json at all").await;
    assert!(ack.is_ignored());

    let app = build_router(state);
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from("not json at all"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.batches().is_empty());
}

#[tokio::test]
async fn payload_without_id_is_ignored() {
    let sink = Arc::new(RecordingSink::default());
    let (state, _db) = setup_state(sink.clone()).await;

    let ack = report::handle_push(&state, &envelope_body(&json!({}))).await;
    assert!(ack.is_ignored());
    assert!(sink.batches().is_empty());
}

#[tokio::test]
async fn absent_record_is_ignored() {
    let sink = Arc::new(RecordingSink::default());
    let (state, _db) = setup_state(sink.clone()).await;

    let ack = report::handle_push(&state, &classified_body(Uuid::new_v4())).await;
    assert!(ack.is_ignored());
    assert!(sink.batches().is_empty());
}

#[tokio::test]
async fn sink_failure_is_suppressed_and_record_unstamped() {
    let (state, db) = setup_state(Arc::new(FailingSink)).await;
    let guid = seed_classified_record(&db, "lost row", 0.1, 0.2).await;

    let ack = report::handle_push(&state, &classified_body(guid)).await;
    assert!(ack.is_suppressed());

    // The row is permanently missing and the record shows it
    let record = get_feedback(&db, guid).await.unwrap().unwrap();
    assert!(record.reported_at.is_none());
}

#[tokio::test]
async fn redelivery_after_success_does_not_duplicate_rows() {
    let sink = Arc::new(RecordingSink::default());
    let (state, db) = setup_state(sink.clone()).await;
    let guid = seed_classified_record(&db, "once is enough", 0.4, 0.5).await;

    let first = report::handle_push(&state, &classified_body(guid)).await;
    assert!(first.is_completed());
    let second = report::handle_push(&state, &classified_body(guid)).await;
    assert!(second.is_completed());

    assert_eq!(sink.batches().len(), 1);
}
