//! Process-lifetime lyrics cache.
//!
//! Entries are keyed by provider plus normalized artist and title, are never
//! evicted, and only ever hold non-empty text. The cache is constructed by the
//! host and injected into the pipeline, so each test can use a fresh store.

use crate::normalize::NormalizedKey;
use crate::provider::ProviderId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const LOG_TARGET: &str = "remixer::cache";

/// One entry per (provider, normalized song)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    provider: ProviderId,
    artist: String,
    title: String,
}

impl CacheKey {
    /// Build a key from an already normalized title/artist pair
    #[must_use]
    pub fn new(provider: ProviderId, key: &NormalizedKey) -> Self {
        Self {
            provider,
            artist: key.artist.clone(),
            title: key.title.clone(),
        }
    }

    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        self.provider
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}::{}", self.provider, self.artist, self.title)
    }
}

/// In-memory lyrics cache
#[derive(Debug, Default)]
pub struct LyricsCache {
    entries: RwLock<HashMap<CacheKey, Arc<str>>>,
}

impl LyricsCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached lyrics
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        let hit = self.entries.read().await.get(key).cloned();
        debug!(target: LOG_TARGET, "Cache {} for {}", if hit.is_some() { "hit" } else { "miss" }, key);
        hit
    }

    /// Store lyrics; blank text is ignored so negative results are never cached.
    ///
    /// Returns whether the entry was stored. Concurrent writers for the same key
    /// race harmlessly: the last one wins.
    pub async fn put(&self, key: CacheKey, text: &str) -> bool {
        if text.trim().is_empty() {
            debug!(target: LOG_TARGET, "Refusing to cache empty lyrics for {}", key);
            return false;
        }
        debug!(target: LOG_TARGET, "Caching {} bytes of lyrics for {}", text.len(), key);
        self.entries.write().await.insert(key, Arc::from(text));
        true
    }

    /// Number of cached songs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(provider: ProviderId, title: &str, artist: &str) -> CacheKey {
        CacheKey::new(provider, &NormalizedKey::new(title, artist))
    }

    #[test]
    fn test_key_format() {
        let k = key(ProviderId::LyricsOvh, "Yesterday (Remastered)", "The Beatles");
        assert_eq!(k.to_string(), "lyrics_ovh::The Beatles::Yesterday");
    }

    #[test]
    fn test_keys_are_provider_scoped() {
        assert_ne!(
            key(ProviderId::LyricsOvh, "Yesterday", "The Beatles"),
            key(ProviderId::Genius, "Yesterday", "The Beatles")
        );
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = LyricsCache::new();
        let k = key(ProviderId::Genius, "Yesterday", "The Beatles");

        assert!(cache.get(&k).await.is_none());
        assert!(cache.put(k.clone(), "Yesterday, all my troubles").await);
        assert_eq!(
            cache.get(&k).await.as_deref(),
            Some("Yesterday, all my troubles")
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_not_cached() {
        let cache = LyricsCache::new();
        let k = key(ProviderId::Audd, "Yesterday", "The Beatles");

        assert!(!cache.put(k.clone(), "  \n ").await);
        assert!(cache.get(&k).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let cache = LyricsCache::new();
        let k = key(ProviderId::LyricsOvh, "Yesterday", "The Beatles");

        cache.put(k.clone(), "first").await;
        cache.put(k.clone(), "second").await;
        assert_eq!(cache.get(&k).await.as_deref(), Some("second"));
        assert_eq!(cache.len().await, 1);
    }
}
