//! Reporting stage logic
//!
//! One invocation per push delivery. The record is re-fetched at consume
//! time and appended to the report sink as a fixed shape of label/value rows
//! with a schema-version tag and a blank separator row. Append failures are
//! suppressed like every other failure in the bus-driven stages: the row is
//! permanently missing and `reported_at` stays null.

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use kudos_common::db::feedback::{get_feedback, mark_reported, FeedbackRecord};
use kudos_common::events::{FeedbackClassified, PushEnvelope};
use kudos_common::{Ack, Result};

use crate::sheets::ReportSink;
use crate::AppState;

/// Schema-version tag written with every report
const REPORT_VERSION: &str = "v1";

/// Handle one `feedback-classified` push delivery
pub async fn handle_push(state: &AppState, body: &[u8]) -> Ack {
    let envelope: PushEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Unparsable push envelope, ignoring: {}", e);
            return Ack::Ignored("unparsable envelope");
        }
    };

    let payload: FeedbackClassified = match envelope.decode() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Undecodable push payload, ignoring: {}", e);
            return Ack::Ignored("undecodable payload");
        }
    };

    let Some(feedback_id) = payload.classified_feedback_id else {
        warn!("Push payload carries no feedback id, ignoring");
        return Ack::Ignored("missing feedback id");
    };

    match report(state, feedback_id).await {
        Ok(ack) => ack,
        Err(e) => {
            error!(
                "Reporting of {} failed, acknowledging anyway: {}",
                feedback_id, e
            );
            Ack::Suppressed(e)
        }
    }
}

async fn report(state: &AppState, feedback_id: Uuid) -> Result<Ack> {
    let record = match get_feedback(&state.db, feedback_id).await? {
        Some(record) => record,
        None => {
            warn!("No feedback record {}, ignoring delivery", feedback_id);
            return Ok(Ack::Ignored("record not found"));
        }
    };

    if record.reported_at.is_some() {
        // Redelivery of a record that already made it into the report;
        // appending again would duplicate the rows
        debug!("Record {} already reported, skipping append", feedback_id);
        return Ok(Ack::Completed);
    }

    state.sink.append_rows(&report_rows(&record)).await?;

    if !mark_reported(&state.db, feedback_id).await? {
        // A concurrent duplicate appended in parallel; the report now holds
        // two row sets, which at-least-once delivery permits
        debug!("Record {} was stamped concurrently", feedback_id);
    }

    info!("Record {} appended to report", feedback_id);
    Ok(Ack::Completed)
}

/// Fixed row shape of one reported record
fn report_rows(record: &FeedbackRecord) -> Vec<Vec<Value>> {
    vec![
        vec![json!("feedback"), json!(record.feedback)],
        vec![json!("createdAt"), json!(record.created_at.to_rfc3339())],
        vec![json!("sentimentScore"), json!(record.sentiment_score)],
        vec![json!("sentimentMagnitude"), json!(record.sentiment_magnitude)],
        vec![json!("version"), json!(REPORT_VERSION)],
        vec![json!(""), json!("")],
    ]
}
