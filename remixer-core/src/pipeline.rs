//! Lyrics rewrite pipeline.
//!
//! One call to [`RemixPipeline::remix`] runs every stage at most once:
//! validate, normalize, cache lookup, provider fetch (on miss), prompt build,
//! model resolution, completion, and the optional catalog link. Every failure
//! ends the run with a [`CoreError`] whose status code tells the caller which
//! stage gave up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{CacheKey, LyricsCache};
use crate::catalog::SongCatalog;
use crate::completion::CompletionRouter;
use crate::error::CoreError;
use crate::model::{ModelCatalog, ModelId};
use crate::normalize::NormalizedKey;
use crate::prompt::build_prompt;
use crate::provider::{LyricsResult, ProviderId, ProviderRegistry};
use crate::stage::{Stage, StageTimer};

const LOG_TARGET: &str = "remixer::pipeline";

/// Inbound rewrite request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemixRequest {
    pub title: String,
    pub artist: String,
    pub theme: String,
    /// Lyrics provider identifier; the configured default when absent
    #[serde(default)]
    pub provider: Option<String>,
}

impl RemixRequest {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            theme: theme.into(),
            provider: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Reject requests missing a title, artist or theme
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] naming the first blank field.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("title", &self.title),
            ("artist", &self.artist),
            ("theme", &self.theme),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidRequest {
                    reason: format!("{field} must not be empty"),
                });
            }
        }
        Ok(())
    }
}

/// Where the original lyrics came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsSource {
    Cache,
    Provider,
}

/// Successful rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemixOutput {
    pub lyrics: String,
    pub model: ModelId,
    pub provider: ProviderId,
    pub lyrics_source: LyricsSource,
    pub apple_music_url: Option<String>,
}

/// The rewrite orchestrator. Cheap to share behind an `Arc`.
pub struct RemixPipeline {
    cache: Arc<LyricsCache>,
    providers: ProviderRegistry,
    router: CompletionRouter,
    models: ModelCatalog,
    default_provider: ProviderId,
    catalog: Option<Arc<dyn SongCatalog>>,
}

impl RemixPipeline {
    /// Create a pipeline that defaults to `lyrics_ovh` and attaches no store link
    #[must_use]
    pub fn new(
        cache: Arc<LyricsCache>,
        providers: ProviderRegistry,
        router: CompletionRouter,
        models: ModelCatalog,
    ) -> Self {
        Self {
            cache,
            providers,
            router,
            models,
            default_provider: ProviderId::LyricsOvh,
            catalog: None,
        }
    }

    /// Provider used when a request does not name one
    #[must_use]
    pub const fn with_default_provider(mut self, provider: ProviderId) -> Self {
        self.default_provider = provider;
        self
    }

    /// Catalog used to attach a store link to successful rewrites
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn SongCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<LyricsCache> {
        &self.cache
    }

    #[must_use]
    pub const fn models(&self) -> &ModelCatalog {
        &self.models
    }

    #[must_use]
    pub const fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Run the full rewrite for one request.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRequest`] for blank fields, including a title or
    ///   artist that is nothing but annotations (400)
    /// - [`CoreError::UnsupportedProvider`] / [`CoreError::LyricsNotFound`] (404)
    /// - [`CoreError::MissingCredential`], [`CoreError::LyricsProviderFailed`],
    ///   [`CoreError::CompletionFailed`] and other upstream failures (500)
    pub async fn remix(
        &self,
        request: &RemixRequest,
        requested_model: Option<&str>,
    ) -> Result<RemixOutput, CoreError> {
        StageTimer::start(Stage::Validate).observe(request.validate(), "valid")?;

        let timer = StageTimer::start(Stage::Normalize);
        let key = NormalizedKey::new(&request.title, &request.artist);
        let emptied = [("title", &key.title), ("artist", &key.artist)]
            .into_iter()
            .find_map(|(field, value)| value.is_empty().then_some(field));
        if let Some(field) = emptied {
            let err = CoreError::InvalidRequest {
                reason: format!("{field} is empty once annotations are removed"),
            };
            timer.fail(&err);
            return Err(err);
        }
        timer.finish("normalized");

        info!(
            target: LOG_TARGET,
            "Remixing {} - {} (theme: {:?}, provider: {:?})",
            key.artist, key.title, request.theme, request.provider
        );

        let provider = self.resolve_provider(request.provider.as_deref())?;
        let (original, lyrics_source) = self.resolve_lyrics(provider, &key).await?;

        let timer = StageTimer::start(Stage::PromptBuild);
        let prompt = build_prompt(&key.title, &key.artist, &request.theme, &original);
        timer.finish("built");

        let timer = StageTimer::start(Stage::ModelResolve);
        let model = self.models.resolve(requested_model);
        if requested_model.is_some_and(|m| !self.models.is_allowed(m.trim())) {
            info!(
                target: LOG_TARGET,
                "Requested model {:?} is not allowed, using {}", requested_model, model
            );
            timer.finish("defaulted");
        } else {
            timer.finish("resolved");
        }

        let timer = StageTimer::start(Stage::Completion);
        let lyrics = timer.observe(self.router.complete(&model, &prompt).await, "completed")?;

        let apple_music_url = self.link(&key).await;

        Ok(RemixOutput {
            lyrics,
            model,
            provider,
            lyrics_source,
            apple_music_url,
        })
    }

    /// Map a requested provider name to a registered provider.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedProvider`] for unknown or disabled providers.
    pub fn resolve_provider(&self, requested: Option<&str>) -> Result<ProviderId, CoreError> {
        let id = match requested {
            None => self.default_provider,
            Some(raw) => ProviderId::parse(raw).ok_or_else(|| CoreError::UnsupportedProvider {
                provider: raw.to_string(),
            })?,
        };

        if self.providers.get(id).is_none() {
            warn!(target: LOG_TARGET, "Provider {} is not enabled", id);
            return Err(CoreError::UnsupportedProvider {
                provider: id.to_string(),
            });
        }
        Ok(id)
    }

    /// Return cached lyrics, or fetch them once from the provider and cache them.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LyricsNotFound`] when the provider has no match, or the
    /// provider's own error when the call fails.
    pub async fn resolve_lyrics(
        &self,
        provider_id: ProviderId,
        key: &NormalizedKey,
    ) -> Result<(Arc<str>, LyricsSource), CoreError> {
        let cache_key = CacheKey::new(provider_id, key);

        let timer = StageTimer::start(Stage::CacheLookup);
        if let Some(cached) = self.cache.get(&cache_key).await {
            timer.finish("hit");
            info!(target: LOG_TARGET, "Using cached lyrics for {}", cache_key);
            return Ok((cached, LyricsSource::Cache));
        }
        timer.finish("miss");

        let provider = self
            .providers
            .get(provider_id)
            .ok_or_else(|| CoreError::UnsupportedProvider {
                provider: provider_id.to_string(),
            })?;

        let timer = StageTimer::start(Stage::LyricsFetch);
        let fetched = match provider.fetch(key).await {
            Ok(LyricsResult::Found(text)) => {
                timer.finish("found");
                text
            }
            Ok(LyricsResult::NotFound) => {
                let err = CoreError::LyricsNotFound {
                    track: key.title.clone(),
                    artist: key.artist.clone(),
                };
                timer.fail(&err);
                return Err(err);
            }
            Err(e) => {
                timer.fail(&e);
                return Err(e);
            }
        };

        info!(
            target: LOG_TARGET,
            "Fetched {} bytes of lyrics from {}",
            fetched.len(),
            provider.name()
        );
        self.cache.put(cache_key, &fetched).await;
        Ok((Arc::from(fetched), LyricsSource::Provider))
    }

    /// Best-effort store link; failures are logged and never fail the rewrite
    async fn link(&self, key: &NormalizedKey) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        let timer = StageTimer::start(Stage::CatalogLink);

        match catalog.search(&key.search_terms(), 1).await {
            Ok(tracks) => {
                let url = tracks.into_iter().find_map(|t| t.apple_music_url);
                timer.finish(if url.is_some() { "linked" } else { "no_match" });
                url
            }
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    "{} lookup failed, returning lyrics without a link: {}",
                    catalog.name(),
                    e
                );
                timer.fail(&e);
                None
            }
        }
    }
}

impl std::fmt::Debug for RemixPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemixPipeline")
            .field("providers", &self.providers)
            .field("router", &self.router)
            .field("models", &self.models)
            .field("default_provider", &self.default_provider)
            .field("catalog", &self.catalog.as_ref().map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogTrack;
    use crate::completion::CompletionBackend;
    use crate::model::{BackendKind, DEFAULT_MODEL};
    use crate::provider::LyricsProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const YESTERDAY: &str = "Yesterday, all my troubles seemed so far away";

    /// Provider whose answer is fixed up front and whose calls are counted
    struct ScriptedProvider {
        id: ProviderId,
        answer: fn() -> Result<LyricsResult, CoreError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<NormalizedKey>>,
    }

    impl ScriptedProvider {
        fn new(id: ProviderId, answer: fn() -> Result<LyricsResult, CoreError>) -> Arc<Self> {
            Arc::new(Self {
                id,
                answer,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LyricsProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn fetch(&self, key: &NormalizedKey) -> Result<LyricsResult, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(key.clone());
            (self.answer)()
        }
    }

    fn found() -> Result<LyricsResult, CoreError> {
        Ok(LyricsResult::Found(YESTERDAY.to_string()))
    }

    fn not_found() -> Result<LyricsResult, CoreError> {
        Ok(LyricsResult::NotFound)
    }

    fn missing_token() -> Result<LyricsResult, CoreError> {
        Err(CoreError::MissingCredential {
            credential: "AUDD_API_TOKEN",
            consumer: "audd",
        })
    }

    fn unreachable_provider() -> Result<LyricsResult, CoreError> {
        Err(CoreError::provider_failed("lyrics_ovh", "connection refused"))
    }

    /// Backend that echoes the theme line or fails on demand
    struct ScriptedBackend {
        kind: BackendKind,
        fail: bool,
        models: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(kind: BackendKind, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                fail,
                models: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn models(&self) -> Vec<String> {
            self.models.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, model: &str, prompt: &str) -> Result<String, CoreError> {
            self.models.lock().unwrap().push(model.to_string());
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(CoreError::completion_failed("scripted", "no choices returned"));
            }
            Ok("Cat-erday, all my hairballs seemed so far away".to_string())
        }
    }

    struct FixedCatalog(Result<Vec<CatalogTrack>, ()>);

    #[async_trait]
    impl SongCatalog for FixedCatalog {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _term: &str, _limit: u32) -> Result<Vec<CatalogTrack>, CoreError> {
            self.0.clone().map_err(|()| CoreError::CatalogFailed {
                reason: "status 503".into(),
            })
        }
    }

    struct Harness {
        pipeline: RemixPipeline,
        provider: Arc<ScriptedProvider>,
        aggregator: Arc<ScriptedBackend>,
        first_party: Arc<ScriptedBackend>,
    }

    fn harness(
        id: ProviderId,
        answer: fn() -> Result<LyricsResult, CoreError>,
        completion_fails: bool,
    ) -> Harness {
        let provider = ScriptedProvider::new(id, answer);
        let aggregator = ScriptedBackend::new(BackendKind::Aggregator, completion_fails);
        let first_party = ScriptedBackend::new(BackendKind::FirstParty, completion_fails);

        let pipeline = RemixPipeline::new(
            Arc::new(LyricsCache::new()),
            ProviderRegistry::new().with_provider(provider.clone()),
            CompletionRouter::new()
                .with_backend(aggregator.clone())
                .with_backend(first_party.clone()),
            ModelCatalog::default(),
        );

        Harness {
            pipeline,
            provider,
            aggregator,
            first_party,
        }
    }

    fn yesterday() -> RemixRequest {
        RemixRequest::new("Yesterday (Remastered)", "The Beatles", "Cats").with_provider("lyrics.ovh")
    }

    #[tokio::test]
    async fn test_repeat_request_is_served_from_cache() {
        let h = harness(ProviderId::LyricsOvh, found, false);

        let first = h.pipeline.remix(&yesterday(), None).await.unwrap();
        assert!(!first.lyrics.is_empty());
        assert_eq!(first.lyrics_source, LyricsSource::Provider);

        let second = h.pipeline.remix(&yesterday(), None).await.unwrap();
        assert!(!second.lyrics.is_empty());
        assert_eq!(second.lyrics_source, LyricsSource::Cache);

        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_spelling_variants_share_one_fetch() {
        let h = harness(ProviderId::LyricsOvh, found, false);

        for (title, artist) in [
            ("Yesterday (Remastered)", "The Beatles"),
            ("Yesterday [Live]", "The Beatles"),
            ("  Yesterday feat. Nobody", "The Beatles (UK)"),
            ("Yesterday", "The Beatles"),
        ] {
            let request = RemixRequest::new(title, artist, "Cats");
            h.pipeline.remix(&request, None).await.unwrap();
        }

        assert_eq!(h.provider.calls(), 1);
        assert_eq!(
            h.provider.seen.lock().unwrap()[0],
            NormalizedKey::new("Yesterday", "The Beatles")
        );
    }

    #[tokio::test]
    async fn test_provider_not_found_is_404_and_not_cached() {
        let h = harness(ProviderId::LyricsOvh, not_found, false);

        let err = h.pipeline.remix(&yesterday(), None).await.unwrap_err();
        assert!(matches!(err, CoreError::LyricsNotFound { .. }));
        assert_eq!(err.status_code(), 404);
        assert!(h.pipeline.cache().is_empty().await);
        assert!(h.aggregator.models().is_empty());

        // negative results are not cached, so the provider is asked again
        let _ = h.pipeline.remix(&yesterday(), None).await;
        assert_eq!(h.provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_and_cache_untouched() {
        let h = harness(ProviderId::Audd, missing_token, false);
        let request = RemixRequest::new("Yesterday", "The Beatles", "Cats").with_provider("audd");

        let err = h.pipeline.remix(&request, None).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("AUDD_API_TOKEN"));
        assert!(h.pipeline.cache().is_empty().await);
        assert!(h.aggregator.models().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_credential_check() {
        let h = harness(ProviderId::Audd, missing_token, false);
        let key = NormalizedKey::new("Yesterday", "The Beatles");
        h.pipeline
            .cache()
            .put(CacheKey::new(ProviderId::Audd, &key), YESTERDAY)
            .await;

        let request = RemixRequest::new("Yesterday", "The Beatles", "Cats").with_provider("audd");
        let out = h.pipeline.remix(&request, None).await.unwrap();

        assert_eq!(out.lyrics_source, LyricsSource::Cache);
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_500() {
        let h = harness(ProviderId::LyricsOvh, unreachable_provider, false);

        let err = h.pipeline.remix(&yesterday(), None).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, CoreError::LyricsProviderFailed { .. }));
        assert!(h.pipeline.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_completion_failure_is_500() {
        let h = harness(ProviderId::LyricsOvh, found, true);

        let err = h.pipeline.remix(&yesterday(), None).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, CoreError::CompletionFailed { .. }));
        // lyrics were still cached before the completion stage
        assert_eq!(h.pipeline.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_unrecognized_model_falls_back_to_default() {
        let h = harness(ProviderId::LyricsOvh, found, false);

        let out = h
            .pipeline
            .remix(&yesterday(), Some("evil/unlisted-model"))
            .await
            .unwrap();

        assert_eq!(out.model.as_str(), DEFAULT_MODEL);
        assert_eq!(h.aggregator.models(), vec![DEFAULT_MODEL.to_string()]);
        assert!(h.first_party.models().is_empty());
    }

    #[tokio::test]
    async fn test_first_party_model_is_routed_with_bare_name() {
        let h = harness(ProviderId::LyricsOvh, found, false);

        let out = h
            .pipeline
            .remix(&yesterday(), Some("openai/gpt-4o"))
            .await
            .unwrap();

        assert_eq!(out.model.as_str(), "openai/gpt-4o");
        assert_eq!(h.first_party.models(), vec!["gpt-4o".to_string()]);
        assert!(h.aggregator.models().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_uses_normalized_names_and_original_lyrics() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        h.pipeline.remix(&yesterday(), None).await.unwrap();

        let prompts = h.aggregator.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"Yesterday\" by The Beatles"));
        assert!(prompts[0].contains("theme of \"Cats\""));
        assert!(prompts[0].ends_with(YESTERDAY));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_404_without_fetch() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        let request = RemixRequest::new("Yesterday", "The Beatles", "Cats").with_provider("musixmatch");

        let err = h.pipeline.remix(&request, None).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_provider_is_404() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        let request = RemixRequest::new("Yesterday", "The Beatles", "Cats").with_provider("genius");

        let err = h.pipeline.remix(&request, None).await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedProvider { .. }));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_default_provider_used_when_absent() {
        let h = harness(ProviderId::Genius, found, false);
        let pipeline = h.pipeline.with_default_provider(ProviderId::Genius);
        let request = RemixRequest::new("Yesterday", "The Beatles", "Cats");

        let out = pipeline.remix(&request, None).await.unwrap();
        assert_eq!(out.provider, ProviderId::Genius);
        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_annotation_only_title_is_400() {
        let h = harness(ProviderId::LyricsOvh, found, false);

        for request in [
            RemixRequest::new("(Intro)", "The Beatles", "Cats"),
            RemixRequest::new("Yesterday", "[Various] feat. Someone", "Cats"),
        ] {
            let err = h.pipeline.remix(&request, None).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidRequest { .. }));
            assert_eq!(err.status_code(), 400);
        }
        assert_eq!(h.provider.calls(), 0);
        assert!(h.pipeline.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_blank_theme_is_400() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        let request = RemixRequest::new("Yesterday", "The Beatles", "  ");

        let err = h.pipeline.remix(&request, None).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest { .. }));
        assert_eq!(err.status_code(), 400);
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_catalog_link_is_attached() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        let pipeline = h.pipeline.with_catalog(Arc::new(FixedCatalog(Ok(vec![CatalogTrack {
            id: 1,
            title: "Yesterday".into(),
            artist: "The Beatles".into(),
            apple_music_url: Some("https://music.apple.com/track/1".into()),
        }]))));

        let out = pipeline.remix(&yesterday(), None).await.unwrap();
        assert_eq!(
            out.apple_music_url.as_deref(),
            Some("https://music.apple.com/track/1")
        );
    }

    #[tokio::test]
    async fn test_catalog_failure_does_not_fail_rewrite() {
        let h = harness(ProviderId::LyricsOvh, found, false);
        let pipeline = h.pipeline.with_catalog(Arc::new(FixedCatalog(Err(()))));

        let out = pipeline.remix(&yesterday(), None).await.unwrap();
        assert!(!out.lyrics.is_empty());
        assert_eq!(out.apple_music_url, None);
    }

    #[test]
    fn test_request_json_shape() {
        let request: RemixRequest = serde_json::from_str(
            r#"{"title":"Yesterday","artist":"The Beatles","theme":"Cats"}"#,
        )
        .unwrap();
        assert_eq!(request.provider, None);
        request.validate().unwrap();
    }
}
