//! Structured events emitted at pipeline stage boundaries.

use crate::error::CoreError;
use std::time::Instant;
use tracing::{info, warn};

const LOG_TARGET: &str = "remixer::pipeline::stage";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Normalize,
    CacheLookup,
    LyricsFetch,
    PromptBuild,
    ModelResolve,
    Completion,
    CatalogLink,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Normalize => "normalize",
            Self::CacheLookup => "cache_lookup",
            Self::LyricsFetch => "lyrics_fetch",
            Self::PromptBuild => "prompt_build",
            Self::ModelResolve => "model_resolve",
            Self::Completion => "completion",
            Self::CatalogLink => "catalog_link",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measures one stage and reports how it ended
#[derive(Debug)]
pub struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    #[must_use]
    pub fn start(stage: Stage) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Report a successful stage with a short outcome label (e.g. "hit", "miss")
    pub fn finish(self, outcome: &str) {
        info!(
            target: LOG_TARGET,
            stage = self.stage.as_str(),
            outcome,
            elapsed_ms = self.elapsed_ms(),
            "stage complete"
        );
    }

    /// Report a failed stage
    pub fn fail(self, error: &CoreError) {
        warn!(
            target: LOG_TARGET,
            stage = self.stage.as_str(),
            outcome = "error",
            status = error.status_code(),
            elapsed_ms = self.elapsed_ms(),
            error = %error,
            "stage failed"
        );
    }

    /// Pass a result through, reporting it on the way
    ///
    /// # Errors
    ///
    /// Returns the original error unchanged.
    pub fn observe<T>(self, result: Result<T, CoreError>, outcome: &str) -> Result<T, CoreError> {
        match &result {
            Ok(_) => self.finish(outcome),
            Err(e) => self.fail(e),
        }
        result
    }
}
