//! Event bus publisher client
//!
//! The bus is an externally managed publish/subscribe transport with named
//! topics and at-least-once push delivery. Publishing is an HTTP round trip
//! against its REST surface; delivery to subscribers is the bus's own job and
//! never goes through this client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::events::encode_payload;
use crate::{Error, Result};

/// Default timeout for publish requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam for publishing pipeline events.
///
/// Stages hold this as `Arc<dyn EventPublisher>` so tests can substitute a
/// recording or failing implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one serializable payload to a named topic
    async fn publish(&self, topic: &str, payload_json: &serde_json::Value) -> Result<()>;
}

/// Publisher backed by the bus's REST endpoint
///
/// Publishes to `{base_url}/v1/topics/{topic}:publish` with the message data
/// base64-encoded, matching the bus's wire contract. The base URL is
/// configurable so a local emulator can stand in for the real bus.
pub struct HttpEventBus {
    http_client: Client,
    base_url: String,
}

impl HttpEventBus {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for HttpEventBus {
    async fn publish(&self, topic: &str, payload_json: &serde_json::Value) -> Result<()> {
        let url = format!("{}/v1/topics/{}:publish", self.base_url, topic);
        let data = encode_payload(payload_json)?;

        debug!("Publishing to topic {} via {}", topic, url);

        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "messages": [{ "data": data }] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "bus returned {} publishing to topic {}",
                response.status(),
                topic
            )));
        }

        Ok(())
    }
}
