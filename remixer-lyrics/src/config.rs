//! Per-provider `[providers.<name>]` sections.

use const_format::concatcp;
use remixer_core::{CoreError, CredentialSource, ProviderId, ProvidersConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const LYRICS_OVH_BASE_URL: &str = "https://api.lyrics.ovh/v1";
pub const FLYLYRICS_BASE_URL: &str = "https://api.flylyrics.com/v1/lyrics";
pub const AUDD_BASE_URL: &str = "https://api.audd.io/findLyrics/";
pub const GENIUS_API_BASE_URL: &str = "https://api.genius.com";
pub const GENIUS_WEB_BASE_URL: &str = "https://genius.com";

/// Environment variable overriding `providers.audd.api_token`
pub const AUDD_TOKEN_ENV: &str = "AUDD_API_TOKEN";
/// Environment variable overriding `providers.genius.access_token`
pub const GENIUS_TOKEN_ENV: &str = "GENIUS_ACCESS_TOKEN";

fn load<T: DeserializeOwned + Default>(
    providers: &ProvidersConfig,
    id: ProviderId,
) -> Result<T, CoreError> {
    providers.get_or_default(id.as_str())
}

/// Settings shared by the two free lookup services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupServiceConfig {
    pub base_url: String,
}

impl LookupServiceConfig {
    /// `[providers.lyrics_ovh]`, falling back to the public endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn lyrics_ovh(providers: &ProvidersConfig) -> Result<Self, CoreError> {
        Self::with_default(providers, ProviderId::LyricsOvh, LYRICS_OVH_BASE_URL)
    }

    /// `[providers.flylyrics]`, falling back to the public endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn flylyrics(providers: &ProvidersConfig) -> Result<Self, CoreError> {
        Self::with_default(providers, ProviderId::FlyLyrics, FLYLYRICS_BASE_URL)
    }

    fn with_default(
        providers: &ProvidersConfig,
        id: ProviderId,
        default_url: &str,
    ) -> Result<Self, CoreError> {
        #[derive(Default, Deserialize)]
        struct Raw {
            base_url: Option<String>,
        }

        let raw: Raw = load(providers, id)?;
        Ok(Self {
            base_url: raw.base_url.unwrap_or_else(|| default_url.to_string()),
        })
    }
}

/// `[providers.audd]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuddConfig {
    #[serde(default = "default_audd_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

fn default_audd_base_url() -> String {
    AUDD_BASE_URL.into()
}

impl Default for AuddConfig {
    fn default() -> Self {
        Self {
            base_url: default_audd_base_url(),
            api_token: None,
        }
    }
}

impl AuddConfig {
    /// Read the section and apply the `AUDD_API_TOKEN` override
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn from_providers(
        providers: &ProvidersConfig,
        credentials: CredentialSource,
    ) -> Result<Self, CoreError> {
        let mut config: Self = load(providers, ProviderId::Audd)?;
        config.api_token = credentials.resolve(config.api_token.as_deref(), AUDD_TOKEN_ENV);
        Ok(config)
    }
}

/// `[providers.genius]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeniusConfig {
    #[serde(default = "default_genius_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_genius_web_base_url")]
    pub web_base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_genius_api_base_url() -> String {
    GENIUS_API_BASE_URL.into()
}

fn default_genius_web_base_url() -> String {
    GENIUS_WEB_BASE_URL.into()
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_genius_api_base_url(),
            web_base_url: default_genius_web_base_url(),
            access_token: None,
        }
    }
}

impl GeniusConfig {
    /// Read the section and apply the `GENIUS_ACCESS_TOKEN` override
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match this shape.
    pub fn from_providers(
        providers: &ProvidersConfig,
        credentials: CredentialSource,
    ) -> Result<Self, CoreError> {
        let mut config: Self = load(providers, ProviderId::Genius)?;
        config.access_token =
            credentials.resolve(config.access_token.as_deref(), GENIUS_TOKEN_ENV);
        Ok(config)
    }
}

/// Config template for the lyrics providers.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.lyrics_ovh]\n",
    "base_url = \"",
    LYRICS_OVH_BASE_URL,
    "\"\n\n",
    "[providers.flylyrics]\n",
    "base_url = \"",
    FLYLYRICS_BASE_URL,
    "\"\n\n",
    "[providers.audd]\n",
    "base_url = \"",
    AUDD_BASE_URL,
    "\"\n",
    "# Required when \"audd\" is enabled; ",
    AUDD_TOKEN_ENV,
    " takes precedence\n",
    "# api_token = \"\"\n\n",
    "[providers.genius]\n",
    "api_base_url = \"",
    GENIUS_API_BASE_URL,
    "\"\n",
    "web_base_url = \"",
    GENIUS_WEB_BASE_URL,
    "\"\n",
    "# Required when \"genius\" is enabled; ",
    GENIUS_TOKEN_ENV,
    " takes precedence\n",
    "# access_token = \"\"\n\n",
);

#[cfg(test)]
mod tests {
    use super::*;
    use remixer_core::{build_config_template, RemixerConfig};

    #[test]
    fn test_defaults_without_sections() {
        let providers = ProvidersConfig::default();

        assert_eq!(
            LookupServiceConfig::lyrics_ovh(&providers).unwrap().base_url,
            LYRICS_OVH_BASE_URL
        );
        assert_eq!(
            LookupServiceConfig::flylyrics(&providers).unwrap().base_url,
            FLYLYRICS_BASE_URL
        );
        let genius: GeniusConfig = load(&providers, ProviderId::Genius).unwrap();
        assert_eq!(genius, GeniusConfig::default());
    }

    #[test]
    fn test_sections_override_urls() {
        let config = RemixerConfig::from_toml(
            r#"
            [providers.lyrics_ovh]
            base_url = "http://127.0.0.1:9000/v1"

            [providers.audd]
            base_url = "http://127.0.0.1:9001/"
            api_token = "configured"
            "#,
        )
        .unwrap();

        assert_eq!(
            LookupServiceConfig::lyrics_ovh(&config.providers).unwrap().base_url,
            "http://127.0.0.1:9000/v1"
        );
        let audd: AuddConfig = load(&config.providers, ProviderId::Audd).unwrap();
        assert_eq!(audd.base_url, "http://127.0.0.1:9001/");
        assert_eq!(audd.api_token.as_deref(), Some("configured"));
    }

    #[test]
    fn test_template_parses() {
        let config = RemixerConfig::from_toml(&build_config_template(&[CONFIG_TEMPLATE])).unwrap();
        config.validate().unwrap();

        let genius: GeniusConfig = load(&config.providers, ProviderId::Genius).unwrap();
        assert_eq!(genius.api_base_url, GENIUS_API_BASE_URL);
        assert_eq!(genius.access_token, None);
    }

    #[test]
    fn test_config_only_credentials_use_the_file() {
        let config = RemixerConfig::from_toml(
            r#"
            [providers.audd]
            api_token = "configured"
            "#,
        )
        .unwrap();

        let audd = AuddConfig::from_providers(&config.providers, CredentialSource::ConfigOnly).unwrap();
        assert_eq!(audd.api_token.as_deref(), Some("configured"));

        let genius =
            GeniusConfig::from_providers(&config.providers, CredentialSource::ConfigOnly).unwrap();
        assert_eq!(genius.access_token, None);
    }
}
