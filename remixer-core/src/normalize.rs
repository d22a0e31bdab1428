//! Title/artist cleanup applied before cache lookups, provider calls and prompts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Parenthetical or bracketed annotations such as "(Remastered 2009)" or "[Live]"
static ANNOTATION_REGEX: OnceLock<Regex> = OnceLock::new();

/// Collaborator suffix marker, matched case-sensitively
const FEATURING_TOKEN: &str = "feat.";

#[allow(clippy::expect_used)] // literal pattern, covered by tests
fn annotation_regex() -> &'static Regex {
    ANNOTATION_REGEX
        .get_or_init(|| Regex::new(r"\(.*?\)|\[.*?\]").expect("annotation pattern is valid"))
}

/// Strip annotations and any "feat." suffix, then trim.
///
/// Pure and infallible: the same input always yields the same output and
/// normalizing an already normalized string leaves it unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let stripped = annotation_regex().replace_all(raw, "");
    let head = stripped
        .split(FEATURING_TOKEN)
        .next()
        .unwrap_or_default();
    head.trim().to_string()
}

/// Raw, user-supplied song reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongQuery {
    pub title: String,
    pub artist: String,
}

impl SongQuery {
    /// Create a new song query
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Normalize both fields
    #[must_use]
    pub fn normalized(&self) -> NormalizedKey {
        NormalizedKey::from_query(self)
    }
}

/// Cleaned title/artist pair used for lookups and prompt content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedKey {
    pub title: String,
    pub artist: String,
}

impl NormalizedKey {
    /// Normalize a raw title/artist pair
    #[must_use]
    pub fn new(raw_title: &str, raw_artist: &str) -> Self {
        Self {
            title: normalize(raw_title),
            artist: normalize(raw_artist),
        }
    }

    #[must_use]
    pub fn from_query(query: &SongQuery) -> Self {
        Self::new(&query.title, &query.artist)
    }

    /// Combined "title artist" search string used by search-style providers
    #[must_use]
    pub fn search_terms(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}
