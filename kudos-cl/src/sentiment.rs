//! Sentiment provider client
//!
//! Wraps the external analysis API behind the [`SentimentAnalyzer`] seam so
//! the stage logic and tests never depend on the concrete provider.

use async_trait::async_trait;
use kudos_common::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for analysis requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sentiment of one document: score in [-1, 1], magnitude in [0, +inf)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub score: f64,
    pub magnitude: f64,
}

/// Seam for the external classification call
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Sentiment>;
}

/// Client for the hosted natural-language API
///
/// Posts to `{endpoint}/v1/documents:analyzeSentiment`; the endpoint is
/// configurable so a fake provider can stand in during development.
pub struct LanguageClient {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LanguageClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    document: Document<'a>,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    doc_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    document_sentiment: DocumentSentiment,
}

#[derive(Debug, Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    magnitude: f64,
}

#[async_trait]
impl SentimentAnalyzer for LanguageClient {
    async fn analyze(&self, text: &str) -> Result<Sentiment> {
        let url = format!("{}/v1/documents:analyzeSentiment", self.endpoint);
        debug!("Requesting sentiment analysis via {}", url);

        let mut request = self.http_client.post(&url).json(&AnalyzeRequest {
            document: Document {
                content: text,
                doc_type: "PLAIN_TEXT",
            },
        });
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "sentiment provider returned {}",
                response.status()
            )));
        }

        let parsed: AnalyzeResponse = response.json().await?;
        Ok(Sentiment {
            score: parsed.document_sentiment.score,
            magnitude: parsed.document_sentiment.magnitude,
        })
    }
}
