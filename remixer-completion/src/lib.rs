//! Chat completion backends.
//!
//! [`OpenAiBackend`] serves the `openai/` namespace with bare model names and
//! [`OpenRouterBackend`] serves every other model id unchanged. Both speak the
//! same `chat/completions` wire format.

mod chat;
pub mod config;
mod openai;
mod openrouter;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use remixer_core::{CompletionRouter, CoreError, RemixerConfig};
use tracing::{info, warn};

pub use config::{OpenAiConfig, OpenRouterConfig, CONFIG_TEMPLATE};
pub use openai::OpenAiBackend;
pub use openrouter::OpenRouterBackend;

const LOG_TARGET: &str = "remixer::completion";

/// Build the router with both backends registered.
///
/// Backends without a key are still registered so that requests routed to
/// them fail with a targeted configuration error instead of a routing error.
///
/// # Errors
///
/// Returns an error if either backend's config section is malformed.
pub fn build_router(
    config: &RemixerConfig,
    client: &reqwest::Client,
) -> Result<CompletionRouter, CoreError> {
    let openai = OpenAiBackend::from_config(
        client.clone(),
        &OpenAiConfig::from_providers(&config.providers, config.credentials)?,
    );
    let openrouter = OpenRouterBackend::from_config(
        client.clone(),
        &OpenRouterConfig::from_providers(&config.providers, config.credentials)?,
    );

    for (name, configured) in [
        ("openai", openai.is_configured()),
        ("openrouter", openrouter.is_configured()),
    ] {
        if configured {
            info!(target: LOG_TARGET, "Completion backend {} configured", name);
        } else {
            warn!(
                target: LOG_TARGET,
                "Completion backend {} has no API key; models routed to it will fail", name
            );
        }
    }

    Ok(CompletionRouter::new()
        .with_backend(Arc::new(openai))
        .with_backend(Arc::new(openrouter)))
}
