use async_trait::async_trait;
use remixer_core::{BackendKind, CompletionBackend, CoreError};

use crate::chat::ChatEndpoint;
use crate::config::{OpenRouterConfig, OPENROUTER_KEY_ENV};

/// Aggregator backend. Receives full namespaced ids such as
/// `tngtech/deepseek-r1t2-chimera:free`.
pub struct OpenRouterBackend {
    endpoint: ChatEndpoint,
}

impl OpenRouterBackend {
    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &OpenRouterConfig) -> Self {
        let endpoint = ChatEndpoint::new(
            client,
            &config.base_url,
            config.api_key.clone(),
            "openrouter",
            OPENROUTER_KEY_ENV,
        )
        .with_header("HTTP-Referer", config.referer.clone())
        .with_header("X-Title", config.title.clone());

        Self { endpoint }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.endpoint.is_configured()
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Aggregator
    }

    fn name(&self) -> &'static str {
        self.endpoint.backend
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CoreError> {
        self.endpoint.complete(model, prompt).await
    }
}
