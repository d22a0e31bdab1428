use async_trait::async_trait;
use remixer_core::{CoreError, LyricsProvider, LyricsResult, NormalizedKey, ProviderId};
use tracing::info;

use crate::config::LookupServiceConfig;
use crate::upstream;

const LOG_TARGET: &str = "remixer::lyrics::lyrics_ovh";

/// lyrics.ovh lookup by artist and title path segments
pub struct LyricsOvhProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LyricsOvhProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &LookupServiceConfig) -> Self {
        Self::new(client, config.base_url.clone())
    }

    fn url(&self, key: &NormalizedKey) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&key.artist),
            urlencoding::encode(&key.title)
        )
    }
}

#[async_trait]
impl LyricsProvider for LyricsOvhProvider {
    fn id(&self) -> ProviderId {
        ProviderId::LyricsOvh
    }

    async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError> {
        info!(
            target: LOG_TARGET,
            "Fetching lyrics from lyrics.ovh for: {} - {}", key.artist, key.title
        );
        upstream::fetch_lyrics_field(&self.client, self.id(), &self.url(key)).await
    }
}
