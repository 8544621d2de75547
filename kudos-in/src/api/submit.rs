//! Feedback submission endpoint
//!
//! Ordering requirement: the `feedback-created` event is published only after
//! the insert succeeds, so a consumer never receives a pointer to a record
//! that does not exist yet. The converse failure (persisted but publish
//! failed) leaves an orphaned record that no stage will ever pick up; the
//! caller gets a 502 and the orphan is logged.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kudos_common::bus::EventPublisher;
use kudos_common::db::feedback::{create_feedback, FeedbackRecord};
use kudos_common::events::{FeedbackCreated, TOPIC_FEEDBACK_CREATED};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

/// POST / - Accept a new feedback submission
///
/// 201 with no payload on success; 400 when the feedback text is missing or
/// blank (no record, no event); 500/502 when a dependency fails.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    let feedback = match req.feedback {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(StatusResponse {
                    status: "error: feedback key missing or empty".to_string(),
                }),
            ));
        }
    };

    let record = FeedbackRecord::new(feedback);

    if let Err(e) = create_feedback(&state.db, &record).await {
        warn!("Failed to persist feedback record: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusResponse {
                status: format!("error: {}", e),
            }),
        ));
    }
    info!("Created feedback record {}", record.guid);

    let payload = match serde_json::to_value(FeedbackCreated::new(record.guid)) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize event for record {}: {}", record.guid, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ));
        }
    };

    match state.bus.publish(TOPIC_FEEDBACK_CREATED, &payload).await {
        Ok(()) => Ok(StatusCode::CREATED),
        Err(e) => {
            // The record exists but nothing will ever process it
            warn!(
                "Publish failed after persist; record {} is orphaned: {}",
                record.guid, e
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}
