//! kudos-rp library - Reporter service
//!
//! Consumes `feedback-classified` push deliveries and appends a formatted
//! representation of the record to the external report sink. Reporting is
//! fire-and-forget from the pipeline's perspective: nothing downstream
//! consumes the `reported_at` stamp, it exists so operators can tell "never
//! reported" apart from "reported" when rows go missing.

use axum::routing::post;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod report;
pub mod sheets;

use sheets::ReportSink;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store pool
    pub db: SqlitePool,
    /// Report sink client
    pub sink: Arc<dyn ReportSink>,
}

impl AppState {
    pub fn new(db: SqlitePool, sink: Arc<dyn ReportSink>) -> Self {
        Self { db, sink }
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
