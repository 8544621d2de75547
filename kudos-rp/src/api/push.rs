//! Push delivery endpoint
//!
//! Answers 200 unconditionally; see the classifier's push endpoint for the
//! reasoning. The `Ack` only reaches the logs.

use axum::{body::Bytes, extract::State, http::StatusCode};
use tracing::debug;

use crate::{report, AppState};

/// POST / - Receive one `feedback-classified` push delivery
pub async fn receive_push(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let ack = report::handle_push(&state, &body).await;
    debug!("Delivery acknowledged: {:?}", ack);
    StatusCode::OK
}
