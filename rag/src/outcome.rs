//! Results returned by the letter pipeline.

use serde::Serialize;

/// A pipeline step that fell back to a degraded result instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The prompt could not be embedded; generation ran without context.
    EmbeddingFailed { reason: String },

    /// The store query failed; generation ran without context.
    RetrievalFailed { reason: String },

    /// The query ran but the store had nothing to return.
    NoContextFound,

    /// The generation backend failed; the result holds an error message.
    GenerationFailed { reason: String },

    /// Auto-learn was requested but the output was not fed back.
    FeedbackSkipped { reason: String },

    /// The output was accepted for feedback but could not be indexed.
    FeedbackUnindexed { id: String, reason: String },

    /// Pruning old generated samples failed.
    RetentionFailed { reason: String },
}

/// Result of ingesting one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Embedded and written to the store.
    Stored { id: String },

    /// Accepted under `id`, but not retrievable (no embedding, or the store
    /// refused it).
    Unindexed { id: String, reason: String },

    /// Not accepted at all.
    Rejected { reason: String },
}

impl IngestOutcome {
    /// The identifier assigned to the sample, if it was accepted.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Stored { id } | Self::Unindexed { id, .. } => Some(id),
            Self::Rejected { .. } => None,
        }
    }

    /// Whether the sample is now retrievable.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Result of generating one letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterOutcome {
    /// The generated letter, or an error message when generation failed.
    pub result: String,

    /// Short previews of the samples used as context, in retrieval order.
    pub context_used: Vec<String>,

    /// Steps that degraded along the way. Empty on a clean run.
    pub degradations: Vec<Degradation>,
}

impl LetterOutcome {
    /// Whether the generation backend produced the result.
    pub fn is_generated(&self) -> bool {
        !self
            .degradations
            .iter()
            .any(|d| matches!(d, Degradation::GenerationFailed { .. }))
    }
}
