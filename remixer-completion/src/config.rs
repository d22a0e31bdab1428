//! `[providers.openai]` and `[providers.openrouter]` sections.

use const_format::concatcp;
use remixer_core::{CoreError, CredentialSource, ProvidersConfig};
use serde::{Deserialize, Serialize};

pub const OPENAI_SECTION: &str = "openai";
pub const OPENROUTER_SECTION: &str = "openrouter";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable overriding `providers.openai.api_key`
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding `providers.openrouter.api_key`
pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";

const DEFAULT_REFERER: &str = "http://localhost:3000";
const DEFAULT_TITLE: &str = "Karaoke AI Lyrics";

/// First-party model host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_openai_base_url() -> String {
    OPENAI_BASE_URL.into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: None,
        }
    }
}

impl OpenAiConfig {
    /// Read the section and apply the `OPENAI_API_KEY` override
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn from_providers(
        providers: &ProvidersConfig,
        credentials: CredentialSource,
    ) -> Result<Self, CoreError> {
        let mut config: Self = providers.get_or_default(OPENAI_SECTION)?;
        config.api_key = credentials.resolve(config.api_key.as_deref(), OPENAI_KEY_ENV);
        Ok(config)
    }
}

/// Aggregator routing to third-party models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` for app attribution
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title` for app attribution
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_openrouter_base_url() -> String {
    OPENROUTER_BASE_URL.into()
}

fn default_referer() -> String {
    DEFAULT_REFERER.into()
}

fn default_title() -> String {
    DEFAULT_TITLE.into()
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: default_openrouter_base_url(),
            api_key: None,
            referer: default_referer(),
            title: default_title(),
        }
    }
}

impl OpenRouterConfig {
    /// Read the section and apply the `OPENROUTER_API_KEY` override
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn from_providers(
        providers: &ProvidersConfig,
        credentials: CredentialSource,
    ) -> Result<Self, CoreError> {
        let mut config: Self = providers.get_or_default(OPENROUTER_SECTION)?;
        config.api_key = credentials.resolve(config.api_key.as_deref(), OPENROUTER_KEY_ENV);
        Ok(config)
    }
}

/// Config template for the completion backends.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.openai]\n",
    "# Serves models named \"openai/...\"\n",
    "base_url = \"",
    OPENAI_BASE_URL,
    "\"\n",
    "# ",
    OPENAI_KEY_ENV,
    " takes precedence\n",
    "# api_key = \"\"\n\n",
    "[providers.openrouter]\n",
    "# Serves every other model\n",
    "base_url = \"",
    OPENROUTER_BASE_URL,
    "\"\n",
    "referer = \"",
    DEFAULT_REFERER,
    "\"\n",
    "title = \"",
    DEFAULT_TITLE,
    "\"\n",
    "# ",
    OPENROUTER_KEY_ENV,
    " takes precedence\n",
    "# api_key = \"\"\n\n",
);
