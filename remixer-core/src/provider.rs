use crate::error::CoreError;
use crate::normalize::NormalizedKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Identifies a lyrics provider.
///
/// The string form is stable: it is part of the request contract and of every
/// cache key, so it should not change once established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// lyrics.ovh free lookup service
    LyricsOvh,
    /// Secondary free lookup service
    #[serde(rename = "flylyrics")]
    FlyLyrics,
    /// `AudD` paid fingerprint/lyrics service
    Audd,
    /// Genius search API plus page scrape
    Genius,
}

impl ProviderId {
    /// Every provider this build knows about
    pub const ALL: [Self; 4] = [Self::LyricsOvh, Self::FlyLyrics, Self::Audd, Self::Genius];

    /// Get the string identifier used in requests, config and cache keys
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LyricsOvh => "lyrics_ovh",
            Self::FlyLyrics => "flylyrics",
            Self::Audd => "audd",
            Self::Genius => "genius",
        }
    }

    /// Parse a caller-supplied identifier; `None` for anything unsupported
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            // "lyrics.ovh" is what the web client has always sent
            "lyrics_ovh" | "lyrics.ovh" => Some(Self::LyricsOvh),
            "flylyrics" => Some(Self::FlyLyrics),
            "audd" => Some(Self::Audd),
            "genius" => Some(Self::Genius),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnsupportedProvider {
            provider: s.to_string(),
        })
    }
}

/// Result from a lyrics provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsResult {
    /// Plain lyrics text, never empty
    Found(String),
    /// The provider explicitly has no match
    NotFound,
}

impl LyricsResult {
    /// Build a result from optional text, treating blank text as not found
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => Self::Found(t.to_string()),
            _ => Self::NotFound,
        }
    }

    /// Check if lyrics were found
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Get the lyrics text if found
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Found(text) => Some(text),
            Self::NotFound => None,
        }
    }
}

/// Trait for lyrics providers.
///
/// Implementations perform at most one upstream attempt per call. Failures to
/// reach or parse the provider are [`CoreError::LyricsProviderFailed`]; an
/// absent credential is [`CoreError::MissingCredential`] and must be reported
/// before any network I/O.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider identifier
    fn id(&self) -> ProviderId;

    /// Get the provider name used in logs
    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    /// Fetch lyrics for a normalized title/artist pair
    async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError>;
}

/// Explicit mapping from provider identifier to its implementation.
///
/// Only providers registered here can be selected by a request; anything else
/// resolves to "lyrics not found".
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn LyricsProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own identifier, replacing any previous one
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn LyricsProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Register a provider under its own identifier, replacing any previous one
    pub fn register(&mut self, provider: Arc<dyn LyricsProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    /// Look up a provider
    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn LyricsProvider>> {
        self.providers.get(&id).cloned()
    }

    /// Identifiers of every registered provider, in a stable order
    #[must_use]
    pub fn ids(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
