use crate::error::{CoreError, Result};
use crate::model::{ModelCatalog, DEFAULT_ALLOWED_MODELS, DEFAULT_MODEL};
use crate::provider::ProviderId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const LOG_TARGET: &str = "remixer::config";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemixerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Provider- and backend-specific sections, keyed by name
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Whether credential env vars may override the file; never read from TOML
    #[serde(skip)]
    pub credentials: CredentialSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default_provider: ProviderId,
    /// Providers a request may select; anything else is reported as not found
    #[serde(default = "default_enabled_providers")]
    pub enabled: Vec<ProviderId>,
}

const fn default_provider() -> ProviderId {
    ProviderId::LyricsOvh
}

fn default_enabled_providers() -> Vec<ProviderId> {
    ProviderId::ALL.to_vec()
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            enabled: default_enabled_providers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_model")]
    pub default: String,
    #[serde(default = "default_allowed_models")]
    pub allowed: Vec<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_allowed_models() -> Vec<String> {
    DEFAULT_ALLOWED_MODELS.iter().map(ToString::to_string).collect()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            allowed: default_allowed_models(),
        }
    }
}

impl ModelsConfig {
    /// Build the model allow-list
    ///
    /// # Errors
    ///
    /// Returns an error if the default model is not in the allow-list.
    pub fn catalog(&self) -> Result<ModelCatalog> {
        ModelCatalog::new(self.allowed.iter().cloned(), self.default.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Attach a store link for the song to successful rewrites
    #[serde(default = "default_true")]
    pub link_results: bool,
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

const fn default_true() -> bool {
    true
}

fn default_catalog_base_url() -> String {
    "https://itunes.apple.com".into()
}

const fn default_search_limit() -> u32 {
    5
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            link_results: default_true(),
            base_url: default_catalog_base_url(),
            search_limit: default_search_limit(),
        }
    }
}

/// Outbound HTTP settings shared by every upstream client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; unset means the transport default (none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Build the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(crate::USER_AGENT);
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub file: bool,
}

/// Dynamic `[providers.<name>]` tables.
///
/// Each provider crate owns the shape of its own section and reads it with
/// [`ProvidersConfig::get`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvidersConfig(toml::Table);

impl ProvidersConfig {
    /// Deserialize the section for one provider, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the section exists but does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .cloned()
            .map(|section| section.try_into::<T>())
            .transpose()
            .map_err(CoreError::from)
    }

    /// Deserialize the section for one provider, falling back to its defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the section exists but does not match `T`.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        Ok(self.get(name)?.unwrap_or_default())
    }

    /// Insert or replace a provider section
    pub fn insert(&mut self, name: impl Into<String>, section: toml::Table) {
        self.0.insert(name.into(), toml::Value::Table(section));
    }
}

/// Where provider credentials are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialSource {
    /// A non-empty environment variable wins over the configured value
    #[default]
    Environment,
    /// Only the configured value counts
    ConfigOnly,
}

impl CredentialSource {
    /// Resolve one credential; blank values count as absent
    #[must_use]
    pub fn resolve(self, configured: Option<&str>, env_var: &str) -> Option<String> {
        match self {
            Self::Environment => {
                resolve_credential_with(configured, env_var, |name| std::env::var(name).ok())
            }
            Self::ConfigOnly => resolve_credential_with(configured, env_var, |_| None),
        }
    }
}

/// Resolve a credential with `lookup` standing in for the environment
#[must_use]
pub fn resolve_credential_with(
    configured: Option<&str>,
    env_var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    lookup(env_var)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|v| !v.trim().is_empty())
                .map(ToString::to_string)
        })
}

impl RemixerConfig {
    /// Get the configuration directory path (~/.config/remixer/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the default config file path (~/.config/remixer/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from an explicit path, or from the default path when one exists.
    ///
    /// With no explicit path and no file at the default location, built-in
    /// defaults are used so the server can start on credentials from the
    /// environment alone.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or the file cannot be
    /// read, parsed, or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CoreError::ConfigNotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    info!(
                        target: LOG_TARGET,
                        "No config file at {}, using built-in defaults",
                        default_path.display()
                    );
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        info!(target: LOG_TARGET, "Loading config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text without validating it
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        self.models.catalog()?;

        if self.lyrics.enabled.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "lyrics.enabled".into(),
            });
        }
        if !self.lyrics.enabled.contains(&self.lyrics.default_provider) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "lyrics.default_provider {} is not in lyrics.enabled",
                    self.lyrics.default_provider
                ),
            });
        }
        if self.catalog.search_limit == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "catalog.search_limit must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Parsed listen address
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| CoreError::ConfigInvalid {
                message: format!("server.bind {:?}: {e}", self.server.bind),
            })
    }

    /// Write the commented template to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_template(path: &Path, provider_templates: &[&str]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, build_config_template(provider_templates))?;
        Ok(())
    }
}

/// Build the full config template from the base template and the sections
/// contributed by provider crates
#[must_use]
pub fn build_config_template(provider_templates: &[&str]) -> String {
    let mut template = CONFIG_TEMPLATE.to_string();
    for section in provider_templates {
        template.push_str(section);
    }
    template
}

const CONFIG_TEMPLATE: &str = r#"# Remixer Configuration
# ~/.config/remixer/config.toml

[server]
bind = "127.0.0.1:3000"

[lyrics]
# Provider used when a request does not name one
default_provider = "lyrics_ovh"
# Providers a request may select: "lyrics_ovh", "flylyrics", "audd", "genius"
enabled = ["lyrics_ovh", "flylyrics", "audd", "genius"]

[models]
# Requests asking for anything outside `allowed` get `default`
default = "tngtech/deepseek-r1t2-chimera:free"
allowed = [
    "tngtech/deepseek-r1t2-chimera:free",
    "meta-llama/llama-3.2-3b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "openai/gpt-4o",
]

[catalog]
# Attach an Apple Music link to rewritten lyrics
link_results = true
base_url = "https://itunes.apple.com"
search_limit = 5

[http]
# Per-request timeout in seconds for every upstream call (unset = no timeout)
# timeout_secs = 30

[logging]
# Also write logs to ~/.cache/remixer/remixer.log
file = false

"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RemixerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lyrics.default_provider, ProviderId::LyricsOvh);
        assert_eq!(config.lyrics.enabled.len(), 4);
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config = RemixerConfig::from_toml(&build_config_template(&[])).unwrap();
        config.validate().unwrap();
        assert_eq!(config.models.default, DEFAULT_MODEL);
        assert_eq!(config.models.allowed.len(), DEFAULT_ALLOWED_MODELS.len());
        assert!(config.catalog.link_results);
        assert_eq!(config.http.timeout(), None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = RemixerConfig::from_toml("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_provider_subset() {
        let config = RemixerConfig::from_toml(
            r#"
            [lyrics]
            default_provider = "genius"
            enabled = ["genius"]
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.lyrics.enabled, vec![ProviderId::Genius]);
    }

    #[test]
    fn test_default_provider_must_be_enabled() {
        let config = RemixerConfig::from_toml(
            r#"
            [lyrics]
            default_provider = "audd"
            enabled = ["lyrics_ovh"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_unknown_provider_name_fails_to_parse() {
        let result = RemixerConfig::from_toml(
            r#"
            [lyrics]
            enabled = ["musixmatch"]
            "#,
        );
        assert!(matches!(result, Err(CoreError::ConfigParseError(_))));
    }

    #[test]
    fn test_default_model_must_be_allowed() {
        let config = RemixerConfig::from_toml(
            r#"
            [models]
            default = "openai/gpt-4o"
            allowed = ["google/gemini-2.0-flash-exp:free"]
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = RemixerConfig::from_toml("[server]\nbind = \"not an address\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_provider_sections() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Section {
            api_token: Option<String>,
        }

        let config = RemixerConfig::from_toml(
            r#"
            [providers.audd]
            api_token = "secret"
            "#,
        )
        .unwrap();

        let audd: Option<Section> = config.providers.get("audd").unwrap();
        assert_eq!(audd.unwrap().api_token.as_deref(), Some("secret"));

        let genius: Section = config.providers.get_or_default("genius").unwrap();
        assert_eq!(genius, Section::default());
    }

    #[test]
    fn test_provider_section_type_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Section {
            api_token: u32,
        }

        let config = RemixerConfig::from_toml("[providers.audd]\napi_token = \"x\"").unwrap();
        assert!(config.providers.get::<Section>("audd").is_err());
    }

    #[test]
    fn test_env_credential_wins_over_config() {
        let env = |name: &str| (name == "AUDD_API_TOKEN").then(|| "from-env".to_string());

        assert_eq!(
            resolve_credential_with(Some("from-config"), "AUDD_API_TOKEN", env).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            resolve_credential_with(Some("from-config"), "GENIUS_ACCESS_TOKEN", env).as_deref(),
            Some("from-config")
        );
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let blank_env = |_: &str| Some("   ".to_string());

        assert_eq!(
            resolve_credential_with(Some("from-config"), "AUDD_API_TOKEN", blank_env).as_deref(),
            Some("from-config")
        );
        assert_eq!(resolve_credential_with(Some("  "), "AUDD_API_TOKEN", |_| None), None);
        assert_eq!(resolve_credential_with(None, "AUDD_API_TOKEN", |_| None), None);
    }

    #[test]
    fn test_config_only_ignores_environment() {
        // PATH is set in every test process
        assert_eq!(CredentialSource::ConfigOnly.resolve(None, "PATH"), None);
        assert_eq!(
            CredentialSource::ConfigOnly.resolve(Some("from-config"), "PATH").as_deref(),
            Some("from-config")
        );
        assert!(CredentialSource::Environment.resolve(None, "PATH").is_some());
    }

    #[test]
    fn test_credentials_default_to_environment() {
        let config = RemixerConfig::from_toml("").unwrap();
        assert_eq!(config.credentials, CredentialSource::Environment);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let path = std::env::temp_dir().join("remixer-config-that-does-not-exist.toml");
        assert!(matches!(
            RemixerConfig::load(Some(&path)),
            Err(CoreError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_write_template_then_load() {
        let dir = std::env::temp_dir().join(format!("remixer-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        RemixerConfig::write_template(&path, &[]).unwrap();

        let config = RemixerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.lyrics.default_provider, ProviderId::LyricsOvh);

        let _ = fs::remove_dir_all(&dir);
    }
}
