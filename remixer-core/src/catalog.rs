//! Song catalog search, used for song pickers and for the companion store link.

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A track returned by a song catalog search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub apple_music_url: Option<String>,
}

/// Trait for song catalogs
#[async_trait]
pub trait SongCatalog: Send + Sync {
    /// Get the catalog name used in logs
    fn name(&self) -> &'static str;

    /// Free-text search returning at most `limit` tracks
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<CatalogTrack>, CoreError>;
}
