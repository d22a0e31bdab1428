use async_trait::async_trait;
use remixer_core::{CoreError, LyricsProvider, LyricsResult, NormalizedKey, ProviderId};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{GeniusConfig, GENIUS_TOKEN_ENV};
use crate::markup::extract_lyrics;
use crate::upstream;

const LOG_TARGET: &str = "remixer::lyrics::genius";

/// Genius search API followed by a scrape of the song page
pub struct GeniusProvider {
    client: reqwest::Client,
    api_base_url: String,
    web_base_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    response: SearchBody,
}

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SongSummary,
}

#[derive(Debug, Deserialize)]
struct SongSummary {
    #[serde(default)]
    path: Option<String>,
}

impl GeniusProvider {
    pub fn new(
        client: reqwest::Client,
        api_base_url: impl Into<String>,
        web_base_url: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            web_base_url: web_base_url.into(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &GeniusConfig) -> Self {
        Self::new(
            client,
            config.api_base_url.clone(),
            config.web_base_url.clone(),
            config.access_token.clone(),
        )
    }

    /// Step one: path of the top search hit
    async fn song_path(&self, token: &str, key: &NormalizedKey) -> Result<Option<String>, CoreError> {
        let url = format!(
            "{}/search?q={}",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&key.search_terms())
        );
        let request = self.client.get(&url).bearer_auth(token);
        let response = upstream::send(self.id(), &url, request).await?;
        if !response.status().is_success() {
            return Err(upstream::status_failure(self.id(), &url, response).await);
        }

        let search: SearchResponse = upstream::decode(self.id(), &url, response).await?;
        Ok(search
            .response
            .hits
            .into_iter()
            .next()
            .and_then(|hit| hit.result.path)
            .filter(|path| !path.is_empty()))
    }

    /// Step two: scrape the song page
    async fn page_lyrics(&self, path: &str) -> Result<LyricsResult, CoreError> {
        let url = format!("{}{}", self.web_base_url.trim_end_matches('/'), path);
        let response = upstream::send(self.id(), &url, self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(upstream::status_failure(self.id(), &url, response).await);
        }

        let html = response
            .text()
            .await
            .map_err(|e| CoreError::provider_failed(self.name(), e))?;
        debug!(target: LOG_TARGET, "Fetched {} bytes of markup from {}", html.len(), url);
        Ok(LyricsResult::from_text(extract_lyrics(&html).as_deref()))
    }
}

#[async_trait]
impl LyricsProvider for GeniusProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Genius
    }

    async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(CoreError::MissingCredential {
                credential: GENIUS_TOKEN_ENV,
                consumer: "genius",
            });
        };

        info!(
            target: LOG_TARGET,
            "Searching Genius for: {} - {}", key.artist, key.title
        );

        match self.song_path(token, key).await? {
            Some(path) => {
                info!(target: LOG_TARGET, "Genius top hit: {}", path);
                self.page_lyrics(&path).await
            }
            None => {
                info!(target: LOG_TARGET, "Genius search returned no song");
                Ok(LyricsResult::NotFound)
            }
        }
    }
}
