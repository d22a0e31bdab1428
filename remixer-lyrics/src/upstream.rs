//! Request helpers shared by the provider adapters.

use remixer_core::{truncate_body, CoreError, LyricsResult, ProviderId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

const LOG_TARGET: &str = "remixer::lyrics::upstream";

/// `{ "lyrics": "..." }` body returned by the free lookup services
#[derive(Debug, Deserialize)]
struct LyricsBody {
    #[serde(default)]
    lyrics: Option<String>,
}

/// Send one request, mapping transport failures to a provider error
pub(crate) async fn send(
    provider: ProviderId,
    endpoint: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, CoreError> {
    debug!(target: LOG_TARGET, "{} GET {}", provider, endpoint);
    request.send().await.map_err(|e| {
        warn!(target: LOG_TARGET, "{} request to {} failed: {}", provider, endpoint, e);
        CoreError::provider_failed(provider.as_str(), e)
    })
}

/// Log and build the error for a non-success upstream status
pub(crate) async fn status_failure(
    provider: ProviderId,
    endpoint: &str,
    response: reqwest::Response,
) -> CoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(
        target: LOG_TARGET,
        "{} returned {} from {}: {}",
        provider,
        status,
        endpoint,
        truncate_body(&body)
    );
    CoreError::provider_failed(provider.as_str(), format!("{endpoint} returned {status}"))
}

/// Decode a JSON body, treating malformed payloads as a provider failure
pub(crate) async fn decode<T: DeserializeOwned>(
    provider: ProviderId,
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, CoreError> {
    let body = response
        .text()
        .await
        .map_err(|e| CoreError::provider_failed(provider.as_str(), e))?;
    serde_json::from_str(&body).map_err(|e| {
        warn!(
            target: LOG_TARGET,
            "{} sent an unreadable body from {}: {} ({})",
            provider,
            endpoint,
            truncate_body(&body),
            e
        );
        CoreError::provider_failed(provider.as_str(), format!("invalid response from {endpoint}: {e}"))
    })
}

/// GET a `{ "lyrics": ... }` endpoint. Any non-success status is "not found".
pub(crate) async fn fetch_lyrics_field(
    client: &reqwest::Client,
    provider: ProviderId,
    url: &str,
) -> Result<LyricsResult, CoreError> {
    let response = send(provider, url, client.get(url)).await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(
            target: LOG_TARGET,
            "{} has no lyrics at {} ({}): {}",
            provider,
            url,
            status,
            truncate_body(&body)
        );
        return Ok(LyricsResult::NotFound);
    }

    let body: LyricsBody = decode(provider, url, response).await?;
    Ok(LyricsResult::from_text(body.lyrics.as_deref()))
}
