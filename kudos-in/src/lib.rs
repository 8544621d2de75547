//! kudos-in library - Intake service
//!
//! Accepts new feedback submissions, persists them as unclassified records,
//! and announces each one on the `feedback-created` topic. The synchronous
//! HTTP caller is the only party in the pipeline that ever sees an error
//! status; everything downstream is bus-driven.

use axum::routing::post;
use axum::Router;
use kudos_common::bus::EventPublisher;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store pool
    pub db: SqlitePool,
    /// Event bus publisher
    pub bus: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(db: SqlitePool, bus: Arc<dyn EventPublisher>) -> Self {
        Self { db, bus }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(api::submit_feedback))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
