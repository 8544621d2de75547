//! Push delivery endpoint
//!
//! The 200 status is the acknowledgment protocol with the bus: anything else
//! triggers redelivery. The handler therefore answers 200 unconditionally,
//! including for bodies that are not even valid envelopes.

use axum::{body::Bytes, extract::State, http::StatusCode};
use tracing::debug;

use crate::{classify, AppState};

/// POST / - Receive one `feedback-created` push delivery
pub async fn receive_push(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let ack = classify::handle_push(&state, &body).await;
    debug!("Delivery acknowledged: {:?}", ack);
    StatusCode::OK
}
