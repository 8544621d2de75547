//! Integration tests for the kudos-in API
//!
//! Tests cover:
//! - Valid submission creates exactly one record and one event
//! - Malformed/empty submissions are rejected with no side effects
//! - Publish failure after persist surfaces to the caller and leaves an orphan
//! - Health endpoint

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use kudos_common::bus::EventPublisher;
use kudos_common::db::feedback::SENTIMENT_UNSET;
use kudos_common::error::Error;
use kudos_common::events::{FeedbackCreated, TOPIC_FEEDBACK_CREATED};
use kudos_in::{build_router, AppState};

/// Publisher that records everything published to it
#[derive(Default)]
struct RecordingBus {
    published: Mutex<Vec<(String, Value)>>,
}

impl RecordingBus {
    fn published(&self) -> Vec<(String, Value)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingBus {
    async fn publish(&self, topic: &str, payload: &Value) -> kudos_common::Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}

/// Publisher that always fails
struct FailingBus;

#[async_trait]
impl EventPublisher for FailingBus {
    async fn publish(&self, _topic: &str, _payload: &Value) -> kudos_common::Result<()> {
        Err(Error::Dependency("bus unavailable".to_string()))
    }
}

async fn setup_app(bus: Arc<dyn EventPublisher>) -> (axum::Router, SqlitePool) {
    let db = kudos_common::db::init_memory_database()
        .await
        .expect("Should create in-memory store");
    let app = build_router(AppState::new(db.clone(), bus));
    (app, db)
}

fn submit_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn record_count(db: &SqlitePool) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM feedback")
        .fetch_one(db)
        .await
        .unwrap()
        .get("n")
}

#[tokio::test]
async fn valid_submission_creates_record_and_event() {
    let bus = Arc::new(RecordingBus::default());
    let (app, db) = setup_app(bus.clone()).await;

    let response = app
        .oneshot(submit_request(json!({ "feedback": "Great service!" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Exactly one record, unclassified with sentinel scores
    let row = sqlx::query("SELECT guid, classified, sentiment_score, sentiment_magnitude FROM feedback")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(record_count(&db).await, 1);
    assert!(!row.get::<bool, _>("classified"));
    assert_eq!(row.get::<f64, _>("sentiment_score"), SENTIMENT_UNSET);
    assert_eq!(row.get::<f64, _>("sentiment_magnitude"), SENTIMENT_UNSET);

    // Exactly one event pointing at that record
    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, TOPIC_FEEDBACK_CREATED);
    let event: FeedbackCreated = serde_json::from_value(published[0].1.clone()).unwrap();
    let guid: String = row.get("guid");
    assert_eq!(event.new_feedback_id, Some(Uuid::parse_str(&guid).unwrap()));
}

#[tokio::test]
async fn missing_feedback_key_is_rejected_without_side_effects() {
    let bus = Arc::new(RecordingBus::default());
    let (app, db) = setup_app(bus.clone()).await;

    let response = app
        .oneshot(submit_request(json!({ "comment": "wrong key" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(record_count(&db).await, 0);
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn blank_feedback_is_rejected() {
    let bus = Arc::new(RecordingBus::default());
    let (app, db) = setup_app(bus.clone()).await;

    let response = app
        .oneshot(submit_request(json!({ "feedback": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(record_count(&db).await, 0);
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn publish_failure_surfaces_and_leaves_orphan() {
    let (app, db) = setup_app(Arc::new(FailingBus)).await;

    let response = app
        .oneshot(submit_request(json!({ "feedback": "lost in transit" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The record was persisted before the publish attempt and stays behind
    assert_eq!(record_count(&db).await, 1);
}

#[tokio::test]
async fn health_endpoint_reports_module() {
    let (app, _db) = setup_app(Arc::new(RecordingBus::default())).await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "kudos-in");
}
