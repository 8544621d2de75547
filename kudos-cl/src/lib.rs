//! kudos-cl library - Classifier service
//!
//! Consumes `feedback-created` push deliveries, enriches the referenced
//! record with sentiment analysis, and announces the result on
//! `feedback-classified`. Every delivery is acknowledged with 200 no matter
//! what happened inside; see [`kudos_common::Ack`] for the taxonomy.

use axum::routing::post;
use axum::Router;
use kudos_common::bus::EventPublisher;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod classify;
pub mod sentiment;

use sentiment::SentimentAnalyzer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store pool
    pub db: SqlitePool,
    /// Event bus publisher
    pub bus: Arc<dyn EventPublisher>,
    /// Sentiment provider client
    pub analyzer: Arc<dyn SentimentAnalyzer>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        bus: Arc<dyn EventPublisher>,
        analyzer: Arc<dyn SentimentAnalyzer>,
    ) -> Self {
        Self { db, bus, analyzer }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(api::receive_push))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
