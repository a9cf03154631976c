//! Retrieval-augmented letter generation with an auto-learn feedback loop.

use std::future::Future;
use std::sync::Arc;

use inkwell_providers::{
    GenerationProvider, GenerationRequest, Metadata, QueryResult, SOURCE_KEY, Sample,
    SimilarityStore, TRIGGER_PROMPT_KEY, metadata,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{PipelineConfig, RetentionPolicy};
use crate::error::{RagError, Result};
use crate::outcome::{Degradation, IngestOutcome, LetterOutcome};

/// `source` tag of samples written by the feedback loop.
pub const AI_GENERATED_SOURCE: &str = "ai_generated";

/// Prefix of the `result` text when the generation backend failed.
pub const GENERATION_FAILURE_PREFIX: &str = "Error generating text: ";

const SYSTEM_INSTRUCTION: &str = "You are an expert ghostwriter. \
I will provide you with several SAMPLES of my previous writing style. \
Your task is to answer the USER REQUEST by strictly mimicking the tone, structure, and vocabulary of the samples. \
If the samples contain the answer, use it. If not, extrapolate the style to the new topic.";

/// Outcome of a single guarded capability call; `Err` carries the reason.
type Attempt<T> = std::result::Result<T, String>;

/// Orchestrates ingestion and generate-with-feedback over two capabilities.
///
/// The pipeline holds no mutable state of its own, so one instance can be
/// shared across tasks behind an `Arc`.
pub struct LetterPipeline {
    /// Text generation and embedding backend.
    llm: Arc<dyn GenerationProvider>,

    /// Similarity store holding the samples.
    store: Arc<dyn SimilarityStore>,

    /// Configuration.
    config: PipelineConfig,
}

impl LetterPipeline {
    /// Create a pipeline with the default configuration.
    pub fn new(llm: Arc<dyn GenerationProvider>, store: Arc<dyn SimilarityStore>) -> Self {
        Self {
            llm,
            store,
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline with the given configuration.
    pub fn with_config(
        llm: Arc<dyn GenerationProvider>,
        store: Arc<dyn SimilarityStore>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { llm, store, config })
    }

    /// The generation backend.
    pub fn generation(&self) -> &Arc<dyn GenerationProvider> {
        &self.llm
    }

    /// The similarity store.
    pub fn store(&self) -> &Arc<dyn SimilarityStore> {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest a writing sample into the knowledge base.
    ///
    /// Samples whose trimmed text is shorter than
    /// [`PipelineConfig::min_sample_chars`] are rejected without touching
    /// either capability. A sample whose embedding fails is still assigned an
    /// id but is never written to the store.
    pub async fn ingest_sample(&self, text: &str, metadata: Option<Metadata>) -> IngestOutcome {
        self.ingest_sample_cancellable(text, metadata, &CancellationToken::new())
            .await
            .unwrap_or_else(|err| IngestOutcome::Rejected {
                reason: err.to_string(),
            })
    }

    /// [`Self::ingest_sample`], aborting with [`RagError::Cancelled`] once
    /// `cancel` fires.
    pub async fn ingest_sample_cancellable(
        &self,
        text: &str,
        metadata: Option<Metadata>,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome> {
        let length = text.trim().chars().count();
        if length < self.config.min_sample_chars {
            debug!("Rejecting sample of {length} characters");
            return Ok(IngestOutcome::Rejected {
                reason: format!(
                    "sample shorter than {} characters",
                    self.config.min_sample_chars
                ),
            });
        }

        let embedding = self.guarded("embedding", cancel, self.llm.embed_text(text)).await?;

        let id = Uuid::new_v4().to_string();
        let metadata = metadata
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                inkwell_providers::metadata([(SOURCE_KEY, self.config.default_source.as_str())])
            });

        let embedding = match embedding {
            Ok(embedding) if !embedding.is_empty() => embedding,
            Ok(_) => {
                warn!("Sample {id} accepted without an embedding");
                return Ok(IngestOutcome::Unindexed {
                    id,
                    reason: "provider returned an empty embedding".to_string(),
                });
            }
            Err(reason) => return Ok(IngestOutcome::Unindexed { id, reason }),
        };

        let sample = Sample::new(id.clone(), text, embedding, metadata);
        match self.guarded("store add", cancel, self.store.add(sample)).await? {
            Ok(()) => {
                info!("Ingested sample {id}");
                Ok(IngestOutcome::Stored { id })
            }
            Err(reason) => Ok(IngestOutcome::Unindexed { id, reason }),
        }
    }

    /// Generate a letter in the style of the closest stored samples.
    ///
    /// Never fails: capability errors degrade to an empty context or an
    /// error message in [`LetterOutcome::result`], and are listed in
    /// [`LetterOutcome::degradations`]. With `auto_learn`, a successful
    /// letter is ingested back into the store.
    pub async fn generate_letter(&self, user_prompt: &str, auto_learn: bool) -> LetterOutcome {
        self.generate_letter_cancellable(user_prompt, auto_learn, &CancellationToken::new())
            .await
            .unwrap_or_else(|err| LetterOutcome {
                result: format!("{GENERATION_FAILURE_PREFIX}{err}"),
                context_used: Vec::new(),
                degradations: vec![Degradation::GenerationFailed {
                    reason: err.to_string(),
                }],
            })
    }

    /// [`Self::generate_letter`], aborting with [`RagError::Cancelled`] once
    /// `cancel` fires. No later step (feedback included) runs after that.
    pub async fn generate_letter_cancellable(
        &self,
        user_prompt: &str,
        auto_learn: bool,
        cancel: &CancellationToken,
    ) -> Result<LetterOutcome> {
        let mut degradations = Vec::new();
        let top_k = self.config.top_k;

        let query_embedding = match self
            .guarded("embedding", cancel, self.llm.embed_text(user_prompt))
            .await?
        {
            Ok(embedding) if !embedding.is_empty() => embedding,
            Ok(_) => {
                degradations.push(Degradation::EmbeddingFailed {
                    reason: "provider returned an empty embedding".to_string(),
                });
                Vec::new()
            }
            Err(reason) => {
                degradations.push(Degradation::EmbeddingFailed { reason });
                Vec::new()
            }
        };

        let similar = if query_embedding.is_empty() {
            Vec::new()
        } else {
            match self
                .guarded("store query", cancel, self.store.query(&query_embedding, top_k))
                .await?
            {
                Ok(mut results) => {
                    results.truncate(top_k);
                    if results.is_empty() {
                        degradations.push(Degradation::NoContextFound);
                    }
                    results
                }
                Err(reason) => {
                    degradations.push(Degradation::RetrievalFailed { reason });
                    Vec::new()
                }
            }
        };
        debug!("Retrieved {} samples as context", similar.len());

        let request = GenerationRequest::new(
            SYSTEM_INSTRUCTION,
            user_instruction(&render_context(&similar), user_prompt),
        );
        let generated = self
            .guarded("generation", cancel, self.llm.generate_text(request))
            .await?;

        let (result, feedback) = match generated {
            Ok(text) if text.trim().is_empty() => (text, Err("generated text is empty")),
            Ok(text) => (text, Ok(())),
            Err(reason) => {
                let result = format!("{GENERATION_FAILURE_PREFIX}{reason}");
                degradations.push(Degradation::GenerationFailed { reason });
                (result, Err("generation failed"))
            }
        };

        if auto_learn {
            match feedback {
                Ok(()) => {
                    self.learn(&result, user_prompt, cancel, &mut degradations)
                        .await?;
                }
                Err(reason) => degradations.push(Degradation::FeedbackSkipped {
                    reason: reason.to_string(),
                }),
            }
        }

        let context_used = similar
            .iter()
            .map(|r| preview(&r.text, self.config.preview_chars))
            .collect();

        Ok(LetterOutcome {
            result,
            context_used,
            degradations,
        })
    }

    /// Feed a generated letter back into the store, then apply retention.
    async fn learn(
        &self,
        letter: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
        degradations: &mut Vec<Degradation>,
    ) -> Result<()> {
        let metadata = metadata([
            (SOURCE_KEY, AI_GENERATED_SOURCE),
            (TRIGGER_PROMPT_KEY, user_prompt),
        ]);

        match self
            .ingest_sample_cancellable(letter, Some(metadata), cancel)
            .await?
        {
            IngestOutcome::Stored { id } => {
                debug!("Learned from generated letter {id}");
            }
            IngestOutcome::Unindexed { id, reason } => {
                degradations.push(Degradation::FeedbackUnindexed { id, reason });
                return Ok(());
            }
            IngestOutcome::Rejected { reason } => {
                degradations.push(Degradation::FeedbackSkipped { reason });
                return Ok(());
            }
        }

        if let RetentionPolicy::MaxGenerated { keep } = self.config.retention {
            match self
                .guarded("store prune", cancel, self.store.prune(AI_GENERATED_SOURCE, keep))
                .await?
            {
                Ok(0) => {}
                Ok(removed) => info!("Retention removed {removed} generated samples"),
                Err(reason) => degradations.push(Degradation::RetentionFailed { reason }),
            }
        }

        Ok(())
    }

    /// Run one capability call under the configured timeout and `cancel`.
    ///
    /// Cancellation is the only error; backend failures and timeouts come
    /// back as `Ok(Err(reason))`.
    async fn guarded<T>(
        &self,
        step: &str,
        cancel: &CancellationToken,
        call: impl Future<Output = inkwell_providers::Result<T>>,
    ) -> Result<Attempt<T>> {
        let timeout = self.config.capability_timeout();

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("{step} cancelled");
                Err(RagError::Cancelled)
            }
            outcome = tokio::time::timeout(timeout, call) => Ok(match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => {
                    warn!("{step} failed: {err}");
                    Err(err.to_string())
                }
                Err(_) => {
                    warn!("{step} timed out after {timeout:?}");
                    Err(format!("{step} timed out after {timeout:?}"))
                }
            }),
        }
    }
}

/// Render retrieved samples as numbered blocks, keeping the store's order.
fn render_context(samples: &[QueryResult]) -> String {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| format!("\n--- SAMPLE {} ---\n{}\n", i + 1, sample.text))
        .collect()
}

fn user_instruction(context: &str, user_prompt: &str) -> String {
    format!("RELEVANT SAMPLES:\n{context}\n\nUSER REQUEST:\n{user_prompt}")
}

/// The first `chars` characters of `text`, followed by an ellipsis.
fn preview(text: &str, chars: usize) -> String {
    let head: String = text.chars().take(chars).collect();
    format!("{head}...")
}
