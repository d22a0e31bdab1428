pub mod cache;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod stage;

use const_format::concatcp;

/// User agent sent on every outbound request
pub const USER_AGENT: &str = concatcp!("remixer/", env!("CARGO_PKG_VERSION"));

pub use cache::{CacheKey, LyricsCache};
pub use catalog::{CatalogTrack, SongCatalog};
pub use completion::{CompletionBackend, CompletionRouter};
pub use config::{
    build_config_template, resolve_credential_with, CatalogConfig, CredentialSource, HttpConfig,
    LoggingConfig, LyricsConfig, ModelsConfig, ProvidersConfig, RemixerConfig, ServerConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{truncate_body, CoreError, ErrorKind};
pub use model::{BackendKind, ModelCatalog, ModelId, DEFAULT_MODEL};
pub use normalize::{normalize, NormalizedKey, SongQuery};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use pipeline::{LyricsSource, RemixOutput, RemixPipeline, RemixRequest};
pub use prompt::build_prompt;
pub use provider::{LyricsProvider, LyricsResult, ProviderId, ProviderRegistry};
