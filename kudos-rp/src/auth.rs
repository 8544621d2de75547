//! Bearer token acquisition for the report sink
//!
//! Tokens come from an external token endpoint and carry an expiry. The
//! provider caches the current token and refreshes it only when it is about
//! to expire, instead of re-deriving credentials on every append.

use kudos_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Default timeout for token requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Fetches and caches bearer tokens from a token endpoint
pub struct TokenProvider {
    http_client: Client,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(token_url: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            token_url,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, refreshed when within the expiry margin.
    ///
    /// The lock is held across the refresh round trip so concurrent callers
    /// do not stampede the token endpoint.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Fetching bearer token from {}", self.token_url);
        let response = self.http_client.get(&self.token_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let parsed: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(parsed.expires_in);
        let expires_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);

        let access_token = parsed.access_token.clone();
        *cached = Some(CachedToken {
            access_token: parsed.access_token,
            expires_at,
        });

        Ok(access_token)
    }
}
