use crate::error::CoreError;
use crate::model::{BackendKind, ModelId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const LOG_TARGET: &str = "remixer::completion";

/// Trait for completion backends.
///
/// A backend receives the model name exactly as it must appear on the wire
/// (already stripped of any routing namespace) and returns the generated text,
/// trimmed and non-empty. An empty answer is a [`CoreError::CompletionFailed`].
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Which routing slot this backend serves
    fn kind(&self) -> BackendKind;

    /// Get the backend name used in logs
    fn name(&self) -> &'static str;

    /// Send a single user message and return the generated text
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CoreError>;
}

/// Routes a model id to the backend that serves it.
///
/// The router trusts its input: allow-list checks happen upstream in
/// [`ModelCatalog::resolve`](crate::model::ModelCatalog::resolve).
#[derive(Clone, Default)]
pub struct CompletionRouter {
    backends: HashMap<BackendKind, Arc<dyn CompletionBackend>>,
}

impl CompletionRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own kind, replacing any previous one
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Look up the backend for a kind
    #[must_use]
    pub fn backend(&self, kind: BackendKind) -> Option<&Arc<dyn CompletionBackend>> {
        self.backends.get(&kind)
    }

    /// Complete a prompt with the backend selected by the model's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend is registered for the route or the
    /// backend call fails.
    pub async fn complete(&self, model: &ModelId, prompt: &str) -> Result<String, CoreError> {
        let (kind, wire_model) = BackendKind::route(model);
        let backend = self
            .backends
            .get(&kind)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!("no {kind} completion backend configured for model {model}"),
            })?;

        debug!(
            target: LOG_TARGET,
            "Routing model {} to {} backend as {}",
            model,
            backend.name(),
            wire_model
        );
        backend.complete(wire_model, prompt).await
    }
}

impl std::fmt::Debug for CompletionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.backends.values().map(|b| b.name()).collect();
        f.debug_struct("CompletionRouter")
            .field("backends", &names)
            .finish()
    }
}
