//! Event payloads and the push-delivery envelope codec
//!
//! Events are minimal pointers, never snapshots: a consumer always re-fetches
//! the record by id and sees whatever state exists at consume time. The bus
//! delivers to subscribers as HTTP POSTs carrying an envelope whose
//! `message.data` is base64-encoded JSON.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Topic receiving a pointer for every newly persisted feedback record
pub const TOPIC_FEEDBACK_CREATED: &str = "feedback-created";

/// Topic receiving a pointer for every successfully classified record
pub const TOPIC_FEEDBACK_CLASSIFIED: &str = "feedback-classified";

/// Payload published on `feedback-created`.
///
/// The id field is optional on the wire so that an envelope missing it
/// decodes cleanly and can be ignored instead of rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreated {
    #[serde(rename = "newFeedbackId", default)]
    pub new_feedback_id: Option<Uuid>,
}

impl FeedbackCreated {
    pub fn new(feedback_id: Uuid) -> Self {
        Self {
            new_feedback_id: Some(feedback_id),
        }
    }
}

/// Payload published on `feedback-classified`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackClassified {
    #[serde(rename = "classifiedFeedbackId", default)]
    pub classified_feedback_id: Option<Uuid>,
}

impl FeedbackClassified {
    pub fn new(feedback_id: Uuid) -> Self {
        Self {
            classified_feedback_id: Some(feedback_id),
        }
    }
}

/// Push-delivery envelope posted by the bus to a subscriber endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

/// Inner message of a push delivery; `data` is base64-encoded JSON
#[derive(Debug, Clone, Deserialize)]
pub struct PushMessage {
    pub data: String,
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
}

impl PushEnvelope {
    /// Decode `message.data` into a typed payload.
    ///
    /// Both base64 and JSON failures map to `InvalidInput` so the caller can
    /// treat a garbled delivery as an ignorable no-op.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.message.data)
            .map_err(|e| Error::InvalidInput(format!("payload is not valid base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidInput(format!("payload is not valid JSON: {}", e)))
    }
}

/// Encode a payload the way the bus encodes `message.data`
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<String> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| Error::Internal(format!("payload serialization failed: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}
