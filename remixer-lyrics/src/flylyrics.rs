use async_trait::async_trait;
use remixer_core::{CoreError, LyricsProvider, LyricsResult, NormalizedKey, ProviderId};
use tracing::info;

use crate::config::LookupServiceConfig;
use crate::upstream;

const LOG_TARGET: &str = "remixer::lyrics::flylyrics";

/// Secondary free lookup service, queried with `title` and `artist` parameters
pub struct FlyLyricsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl FlyLyricsProvider {
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
            "{}?title={}&artist={}",
            self.base_url,
            urlencoding::encode(&key.title),
            urlencoding::encode(&key.artist)
        )
    }
}

#[async_trait]
impl LyricsProvider for FlyLyricsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::FlyLyrics
    }

    async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError> {
        info!(
            target: LOG_TARGET,
            "Fetching lyrics from flylyrics for: {} - {}", key.artist, key.title
        );
        upstream::fetch_lyrics_field(&self.client, self.id(), &self.url(key)).await
    }
}
