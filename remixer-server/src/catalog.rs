//! iTunes Search API song catalog.

use async_trait::async_trait;
use remixer_core::{truncate_body, CatalogTrack, CoreError, SongCatalog};
use serde::Deserialize;
use tracing::{debug, warn};

const LOG_TARGET: &str = "remixer::catalog::itunes";

pub struct ItunesCatalog {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ItunesTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesTrack {
    track_id: Option<u64>,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    artist_name: String,
    track_view_url: Option<String>,
}

impl ItunesTrack {
    fn into_track(self) -> Option<CatalogTrack> {
        Some(CatalogTrack {
            id: self.track_id?,
            title: self.track_name,
            artist: self.artist_name,
            apple_music_url: self.track_view_url,
        })
    }
}

impl ItunesCatalog {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn failed(reason: impl std::fmt::Display) -> CoreError {
        CoreError::CatalogFailed {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl SongCatalog for ItunesCatalog {
    fn name(&self) -> &'static str {
        "itunes"
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<CatalogTrack>, CoreError> {
        let url = format!(
            "{}/search?term={}&entity=song&limit={limit}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(term)
        );
        debug!(target: LOG_TARGET, "GET {}", url);

        let response = self.client.get(&url).send().await.map_err(Self::failed)?;
        let status = response.status();
        // the API answers with text/javascript, so decode the text ourselves
        let body = response.text().await.map_err(Self::failed)?;

        if !status.is_success() {
            warn!(
                target: LOG_TARGET,
                "Search for {:?} returned {}: {}",
                term,
                status,
                truncate_body(&body)
            );
            return Err(Self::failed(format!("status {status}")));
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                target: LOG_TARGET,
                "Search for {:?} returned an unreadable body: {}",
                term,
                truncate_body(&body)
            );
            Self::failed(e)
        })?;

        Ok(parsed
            .results
            .into_iter()
            .filter_map(ItunesTrack::into_track)
            .collect())
    }
}
