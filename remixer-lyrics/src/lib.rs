//! Lyrics provider adapters.
//!
//! One [`LyricsProvider`] implementation per supported service, plus
//! [`build_registry`] which wires the providers enabled in configuration into
//! a [`ProviderRegistry`].

mod audd;
pub mod config;
mod flylyrics;
mod genius;
mod lyrics_ovh;
pub mod markup;
mod upstream;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use remixer_core::{CoreError, LyricsProvider, ProviderId, ProviderRegistry, RemixerConfig};
use tracing::{info, warn};

pub use audd::AuddProvider;
pub use config::{AuddConfig, GeniusConfig, LookupServiceConfig, CONFIG_TEMPLATE};
pub use flylyrics::FlyLyricsProvider;
pub use genius::GeniusProvider;
pub use lyrics_ovh::LyricsOvhProvider;

const LOG_TARGET: &str = "remixer::lyrics";

/// Build the provider for one identifier from its `[providers.<name>]` section
///
/// # Errors
///
/// Returns an error if the provider's config section is malformed.
pub fn build_provider(
    id: ProviderId,
    config: &RemixerConfig,
    client: &reqwest::Client,
) -> Result<Arc<dyn LyricsProvider>, CoreError> {
    let client = client.clone();
    let providers = &config.providers;

    let provider: Arc<dyn LyricsProvider> = match id {
        ProviderId::LyricsOvh => Arc::new(LyricsOvhProvider::from_config(
            client,
            &LookupServiceConfig::lyrics_ovh(providers)?,
        )),
        ProviderId::FlyLyrics => Arc::new(FlyLyricsProvider::from_config(
            client,
            &LookupServiceConfig::flylyrics(providers)?,
        )),
        ProviderId::Audd => {
            let provider = AuddProvider::from_config(
                client,
                &AuddConfig::from_providers(providers, config.credentials)?,
            );
            if !provider.is_configured() {
                warn!(
                    target: LOG_TARGET,
                    "audd is enabled without an API token; requests selecting it will fail"
                );
            }
            Arc::new(provider)
        }
        ProviderId::Genius => Arc::new(GeniusProvider::from_config(
            client,
            &GeniusConfig::from_providers(providers, config.credentials)?,
        )),
    };
    Ok(provider)
}

/// Register every provider listed in `lyrics.enabled`
///
/// # Errors
///
/// Returns an error if any enabled provider's config section is malformed.
pub fn build_registry(
    config: &RemixerConfig,
    client: &reqwest::Client,
) -> Result<ProviderRegistry, CoreError> {
    let mut registry = ProviderRegistry::new();
    for id in &config.lyrics.enabled {
        registry.register(build_provider(*id, config, client)?);
    }

    info!(
        target: LOG_TARGET,
        "Lyrics providers enabled: {:?} (default: {})",
        registry.ids(),
        config.lyrics.default_provider
    );
    Ok(registry)
}
