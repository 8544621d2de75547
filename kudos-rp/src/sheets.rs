//! Report sink client
//!
//! The sink is a spreadsheet addressed by a fixed destination id and target
//! range; a report is a batch of rows appended in one call. The
//! [`ReportSink`] seam keeps the stage logic and tests independent of the
//! concrete spreadsheet provider.

use async_trait::async_trait;
use kudos_common::{Error, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::auth::TokenProvider;

/// Default timeout for append requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam for the external report append call
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()>;
}

/// Client for the hosted spreadsheet API
pub struct SheetsClient {
    http_client: Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    tokens: TokenProvider,
}

impl SheetsClient {
    pub fn new(
        base_url: String,
        spreadsheet_id: String,
        range: String,
        tokens: TokenProvider,
    ) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            range,
            tokens,
        }
    }
}

#[async_trait]
impl ReportSink for SheetsClient {
    async fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()> {
        let token = self.tokens.token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url, self.spreadsheet_id, self.range
        );
        debug!("Appending {} rows via {}", rows.len(), url);

        let response = self
            .http_client
            .post(&url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "report sink returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
