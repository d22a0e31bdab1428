use async_trait::async_trait;
use remixer_core::{CoreError, LyricsProvider, LyricsResult, NormalizedKey, ProviderId};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{AuddConfig, AUDD_TOKEN_ENV};
use crate::upstream;

const LOG_TARGET: &str = "remixer::lyrics::audd";

/// `AudD` paid lyrics search
pub struct AuddProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuddResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    result: Option<Vec<AuddMatch>>,
    #[serde(default)]
    error: Option<AuddError>,
}

#[derive(Debug, Deserialize)]
struct AuddMatch {
    #[serde(default)]
    lyrics: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuddError {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_message: String,
}

impl AuddProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &AuddConfig) -> Self {
        Self::new(client, config.base_url.clone(), config.api_token.clone())
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

#[async_trait]
impl LyricsProvider for AuddProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Audd
    }

    async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError> {
        let Some(token) = self.api_token.as_deref() else {
            warn!(target: LOG_TARGET, "AudD selected but {} is not set", AUDD_TOKEN_ENV);
            return Err(CoreError::MissingCredential {
                credential: AUDD_TOKEN_ENV,
                consumer: "audd",
            });
        };

        info!(
            target: LOG_TARGET,
            "Fetching lyrics from AudD for: {} - {}", key.artist, key.title
        );

        // the token travels in the query string, so only the base URL is logged
        let url = format!(
            "{}?q={}&api_token={}",
            self.base_url,
            urlencoding::encode(&key.search_terms()),
            urlencoding::encode(token)
        );
        let response = upstream::send(self.id(), &self.base_url, self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(upstream::status_failure(self.id(), &self.base_url, response).await);
        }

        let body: AuddResponse = upstream::decode(self.id(), &self.base_url, response).await?;
        if let Some(error) = body.error {
            warn!(
                target: LOG_TARGET,
                "AudD rejected the request (status {:?}, code {}): {}",
                body.status, error.error_code, error.error_message
            );
            return Err(CoreError::provider_failed(
                self.name(),
                format!("error {}: {}", error.error_code, error.error_message),
            ));
        }

        let first = body
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|m| m.lyrics);
        Ok(LyricsResult::from_text(first.as_deref()))
    }
}
