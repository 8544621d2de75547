//! Classification stage logic
//!
//! One invocation per push delivery. The record referenced by the event is
//! re-fetched at consume time (events are pointers, not snapshots), analyzed,
//! and transitioned Created → Classified with a conditional update so that a
//! concurrent duplicate delivery cannot clobber the winner's write.
//!
//! Failure anywhere in fetch, analysis, write-back, or publish is suppressed:
//! the delivery is still acknowledged, the record stays unclassified, and the
//! only trace is the log line. A non-200 here would make the bus redeliver
//! forever.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use kudos_common::bus::EventPublisher;
use kudos_common::db::feedback::{apply_classification, get_feedback};
use kudos_common::events::{
    FeedbackClassified, FeedbackCreated, PushEnvelope, TOPIC_FEEDBACK_CLASSIFIED,
};
use kudos_common::{Ack, Error, Result};

use crate::sentiment::SentimentAnalyzer;
use crate::AppState;

/// Handle one `feedback-created` push delivery
pub async fn handle_push(state: &AppState, body: &[u8]) -> Ack {
    let envelope: PushEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Unparsable push envelope, ignoring: {}", e);
            return Ack::Ignored("unparsable envelope");
        }
    };

    let payload: FeedbackCreated = match envelope.decode() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Undecodable push payload, ignoring: {}", e);
            return Ack::Ignored("undecodable payload");
        }
    };

    let Some(feedback_id) = payload.new_feedback_id else {
        warn!("Push payload carries no feedback id, ignoring");
        return Ack::Ignored("missing feedback id");
    };

    match classify(state, feedback_id).await {
        Ok(ack) => ack,
        Err(e) => {
            error!(
                "Classification of {} failed, acknowledging anyway: {}",
                feedback_id, e
            );
            Ack::Suppressed(e)
        }
    }
}

async fn classify(state: &AppState, feedback_id: Uuid) -> Result<Ack> {
    let record = match get_feedback(&state.db, feedback_id).await? {
        Some(record) => record,
        None => {
            warn!("No feedback record {}, ignoring delivery", feedback_id);
            return Ok(Ack::Ignored("record not found"));
        }
    };

    if record.classified {
        // Redelivery of an already classified record: skip re-analysis but
        // re-announce, so a publish lost by an earlier delivery heals here.
        debug!("Record {} already classified, republishing", feedback_id);
        publish_classified(state, feedback_id).await?;
        return Ok(Ack::Completed);
    }

    let sentiment = state.analyzer.analyze(&record.feedback).await?;

    let applied =
        apply_classification(&state.db, feedback_id, sentiment.score, sentiment.magnitude).await?;
    if !applied {
        // A concurrent duplicate got there first; the winner publishes
        debug!(
            "Record {} was classified concurrently, skipping publish",
            feedback_id
        );
        return Ok(Ack::Completed);
    }

    info!(
        "Record {} classified (score {}, magnitude {})",
        feedback_id, sentiment.score, sentiment.magnitude
    );

    publish_classified(state, feedback_id).await?;
    Ok(Ack::Completed)
}

async fn publish_classified(state: &AppState, feedback_id: Uuid) -> Result<()> {
    let payload = serde_json::to_value(FeedbackClassified::new(feedback_id))
        .map_err(|e| Error::Internal(format!("event serialization failed: {}", e)))?;
    state.bus.publish(TOPIC_FEEDBACK_CLASSIFIED, &payload).await
}
