use std::sync::Arc;

use remixer_core::{CoreError, LyricsCache, RemixPipeline, RemixerConfig, SongCatalog};
use tracing::info;

use crate::catalog::ItunesCatalog;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RemixPipeline>,
    pub catalog: Arc<dyn SongCatalog>,
    pub search_limit: u32,
}

impl AppState {
    /// Wire providers, backends, catalog and a fresh cache from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a provider or
    /// backend section is malformed.
    pub fn from_config(config: &RemixerConfig) -> Result<Self, CoreError> {
        let client = config.http.build_client()?;

        let providers = remixer_lyrics::build_registry(config, &client)?;
        let router = remixer_completion::build_router(config, &client)?;
        let models = config.models.catalog()?;
        let catalog: Arc<dyn SongCatalog> =
            Arc::new(ItunesCatalog::new(client, config.catalog.base_url.clone()));

        let mut pipeline = RemixPipeline::new(Arc::new(LyricsCache::new()), providers, router, models)
            .with_default_provider(config.lyrics.default_provider);
        if config.catalog.link_results {
            pipeline = pipeline.with_catalog(catalog.clone());
        }

        info!(
            "Default model {} ({} allowed)",
            pipeline.models().default_model(),
            pipeline.models().allowed().len()
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            catalog,
            search_limit: config.catalog.search_limit,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pipeline", &self.pipeline)
            .field("catalog", &self.catalog.name())
            .field("search_limit", &self.search_limit)
            .finish()
    }
}
