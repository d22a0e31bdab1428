//! Chat-completions wire format shared by both backends.

use remixer_core::{truncate_body, CoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const LOG_TARGET: &str = "remixer::completion::chat";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// A single user-role message carrying the whole prompt
    pub(crate) const fn single_user_message(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl ChatResponse {
    /// Trimmed text of the first choice; anything else is a completion failure
    pub(crate) fn into_text(self, backend: &str) -> Result<String, CoreError> {
        if let Some(error) = self.error {
            return Err(CoreError::completion_failed(backend, error.message));
        }

        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| CoreError::completion_failed(backend, "response contained no text"))
    }
}

/// One OpenAI-compatible `chat/completions` endpoint
#[derive(Debug, Clone)]
pub(crate) struct ChatEndpoint {
    pub client: reqwest::Client,
    pub url: String,
    pub api_key: Option<String>,
    pub headers: Vec<(&'static str, String)>,
    pub backend: &'static str,
    pub credential: &'static str,
}

impl ChatEndpoint {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        backend: &'static str,
        credential: &'static str,
    ) -> Self {
        Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            headers: Vec::new(),
            backend,
            credential,
        }
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST one chat completion and extract the generated text
    pub(crate) async fn complete(&self, model: &str, prompt: &str) -> Result<String, CoreError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CoreError::MissingCredential {
                credential: self.credential,
                consumer: self.backend,
            });
        };

        debug!(
            target: LOG_TARGET,
            "POST {} (backend: {}, model: {}, prompt: {} bytes)",
            self.url,
            self.backend,
            model,
            prompt.len()
        );

        let mut request = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&ChatRequest::single_user_message(model, prompt));
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|e| {
            warn!(target: LOG_TARGET, "{} request to {} failed: {}", self.backend, self.url, e);
            CoreError::completion_failed(self.backend, e)
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::completion_failed(self.backend, e))?;

        if !status.is_success() {
            warn!(
                target: LOG_TARGET,
                "{} returned {} from {}: {}",
                self.backend,
                status,
                self.url,
                truncate_body(&body)
            );
            return Err(CoreError::completion_failed(
                self.backend,
                format!("{} returned {status}", self.url),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                target: LOG_TARGET,
                "{} sent an unreadable body: {}",
                self.backend,
                truncate_body(&body)
            );
            CoreError::completion_failed(self.backend, format!("invalid response: {e}"))
        })?;

        parsed.into_text(self.backend).inspect_err(|e| {
            warn!(
                target: LOG_TARGET,
                "{} completion for {} unusable ({}): {}",
                self.backend,
                model,
                e,
                truncate_body(&body)
            );
        })
    }
}
