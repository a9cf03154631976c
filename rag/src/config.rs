//! Configuration for the letter pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration for [`crate::LetterPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of samples retrieved as context.
    pub top_k: usize,

    /// Minimum trimmed length (in characters) of an ingestible sample.
    pub min_sample_chars: usize,

    /// Length (in characters) of each context preview returned to callers.
    pub preview_chars: usize,

    /// Upper bound on each embed/query/generate/store call.
    pub capability_timeout_ms: u64,

    /// `source` tag applied when a sample arrives without metadata.
    pub default_source: String,

    /// What to do with accumulated AI-generated samples.
    pub retention: RetentionPolicy,
}

impl PipelineConfig {
    /// Set the retrieval count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the per-call timeout.
    pub fn with_capability_timeout(mut self, timeout: Duration) -> Self {
        self.capability_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1);
        self
    }

    /// Set the retention policy.
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// The per-call timeout as a [`Duration`].
    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be at least 1".to_string()));
        }
        if self.capability_timeout_ms == 0 {
            return Err(RagError::Config(
                "capability_timeout_ms must be at least 1".to_string(),
            ));
        }
        if let RetentionPolicy::MaxGenerated { keep: 0 } = self.retention {
            return Err(RagError::Config(
                "retention keep must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_sample_chars: 10,
            preview_chars: 50,
            capability_timeout_ms: 60_000,
            default_source: "manual_upload".to_string(),
            retention: RetentionPolicy::Unbounded,
        }
    }
}

/// Retention policy for samples produced by the feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every generated sample; the store grows without bound.
    #[default]
    Unbounded,
    /// Keep only the newest `keep` generated samples.
    MaxGenerated { keep: usize },
}
