use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of characters of an upstream body kept in logs and errors
pub const MAX_LOGGED_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Missing credential {credential} required by {consumer}")]
    MissingCredential {
        credential: &'static str,
        consumer: &'static str,
    },

    // Request errors
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // Lyrics errors
    #[error("Lyrics not found for track: {track} by {artist}")]
    LyricsNotFound { track: String, artist: String },

    #[error("Lyrics provider {provider} is not available")]
    UnsupportedProvider { provider: String },

    #[error("Lyrics provider {provider} failed: {reason}")]
    LyricsProviderFailed { provider: String, reason: String },

    // Completion errors
    #[error("Completion backend {backend} failed: {reason}")]
    CompletionFailed { backend: String, reason: String },

    // Catalog errors
    #[error("Song catalog search failed: {reason}")]
    CatalogFailed { reason: String },

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`CoreError`], one per caller-visible outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed inbound request
    InvalidRequest,
    /// The provider has no lyrics for the song (or the provider is not offered)
    LyricsNotFound,
    /// Network or parsing failure while talking to a lyrics provider or catalog
    ProviderUnavailable,
    /// A required credential or config value is absent or invalid
    Configuration,
    /// The completion call failed or returned no usable text
    CompletionFailure,
}

impl ErrorKind {
    /// HTTP status code reported to the caller for this kind of failure
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::LyricsNotFound => 404,
            Self::ProviderUnavailable | Self::Configuration | Self::CompletionFailure => 500,
        }
    }
}

impl CoreError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::LyricsNotFound { .. } | Self::UnsupportedProvider { .. } => {
                ErrorKind::LyricsNotFound
            }
            Self::ConfigNotFound { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigMissingField { .. }
            | Self::ConfigParseError(_)
            | Self::MissingCredential { .. }
            | Self::IoError(_) => ErrorKind::Configuration,
            Self::CompletionFailed { .. } => ErrorKind::CompletionFailure,
            Self::LyricsProviderFailed { .. }
            | Self::CatalogFailed { .. }
            | Self::NetworkError(_) => ErrorKind::ProviderUnavailable,
        }
    }

    /// HTTP status code reported to the caller
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Build a provider failure from any displayable cause
    pub fn provider_failed(provider: &str, reason: impl std::fmt::Display) -> Self {
        Self::LyricsProviderFailed {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a completion failure from any displayable cause
    pub fn completion_failed(backend: &str, reason: impl std::fmt::Display) -> Self {
        Self::CompletionFailed {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Shorten an upstream response body for logging
#[must_use]
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    out.push('…');
    out
}

pub type Result<T> = std::result::Result<T, CoreError>;
