//! Model identifiers, the caller-facing allow-list, and backend routing.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Namespace that selects the first-party completion host
pub const FIRST_PARTY_NAMESPACE: &str = "openai";

/// Model used when the caller asks for nothing or for something not allowed
pub const DEFAULT_MODEL: &str = "tngtech/deepseek-r1t2-chimera:free";

/// Models a caller may request when no allow-list is configured
pub const DEFAULT_ALLOWED_MODELS: [&str; 4] = [
    DEFAULT_MODEL,
    "meta-llama/llama-3.2-3b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "openai/gpt-4o",
];

/// A model identifier of the form `<namespace>/<model>[:tag]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `/`, or the whole id when there is none
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(ns, _)| ns)
    }

    /// The id with its namespace removed, or the whole id when there is none
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which completion backend serves a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// The first-party model host, addressed by bare model name
    FirstParty,
    /// The aggregator, addressed by the full namespaced id
    Aggregator,
}

impl BackendKind {
    /// Pick the backend for a model and the model name to send on the wire.
    ///
    /// `openai/<name>` goes to the first-party host as `<name>`; every other id
    /// goes to the aggregator unchanged.
    #[must_use]
    pub fn route(model: &ModelId) -> (Self, &str) {
        match model
            .as_str()
            .strip_prefix(FIRST_PARTY_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(bare) => (Self::FirstParty, bare),
            None => (Self::Aggregator, model.as_str()),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstParty => "first_party",
            Self::Aggregator => "aggregator",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed set of models callers may request, plus the fallback
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    allowed: Vec<ModelId>,
    default: ModelId,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_MODELS.into_iter().map(ModelId::new).collect(),
            default: ModelId::new(DEFAULT_MODEL),
        }
    }
}

impl ModelCatalog {
    /// Create a catalog; the default must itself be allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the allow-list is empty or does not contain the default.
    pub fn new<I, S>(allowed: I, default: impl Into<String>) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<ModelId> = allowed.into_iter().map(ModelId::new).collect();
        let default = ModelId::new(default);

        if allowed.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "models.allowed must list at least one model".into(),
            });
        }
        if !allowed.contains(&default) {
            return Err(CoreError::ConfigInvalid {
                message: format!("models.default {default} is not in models.allowed"),
            });
        }

        Ok(Self { allowed, default })
    }

    /// Resolve a requested model: allowed ids map to themselves, anything else
    /// (including no request at all) maps to the default.
    #[must_use]
    pub fn resolve(&self, requested: Option<&str>) -> ModelId {
        requested
            .map(str::trim)
            .and_then(|r| self.allowed.iter().find(|m| m.as_str() == r))
            .unwrap_or(&self.default)
            .clone()
    }

    #[must_use]
    pub fn is_allowed(&self, model: &str) -> bool {
        self.allowed.iter().any(|m| m.as_str() == model)
    }

    #[must_use]
    pub fn allowed(&self) -> &[ModelId] {
        &self.allowed
    }

    #[must_use]
    pub const fn default_model(&self) -> &ModelId {
        &self.default
    }
}
