use async_trait::async_trait;
use remixer_core::{BackendKind, CompletionBackend, CoreError};

use crate::chat::ChatEndpoint;
use crate::config::{OpenAiConfig, OPENAI_KEY_ENV};

/// First-party model host. Receives bare model names such as `gpt-4o`.
pub struct OpenAiBackend {
    endpoint: ChatEndpoint,
}

impl OpenAiBackend {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: ChatEndpoint::new(client, base_url, api_key, "openai", OPENAI_KEY_ENV),
        }
    }

    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self::new(client, &config.base_url, config.api_key.clone())
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.endpoint.is_configured()
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FirstParty
    }

    fn name(&self) -> &'static str {
        self.endpoint.backend
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CoreError> {
        self.endpoint.complete(model, prompt).await
    }
}
