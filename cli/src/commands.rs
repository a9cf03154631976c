//! Command execution.

use std::sync::Arc;

use anyhow::Context;
use inkwell_providers::{
    FileStore, GeminiProvider, GenerationProvider, OpenAiProvider, SOURCE_KEY, SimilarityStore,
    metadata,
};
use inkwell_rag::{BulkIngestor, IngestOutcome, LetterPipeline};
use serde_json::{Value, json};
use tracing::info;

use crate::cli::Command;
use crate::config::{InkwellConfig, ProviderKind};

/// Build the pipeline described by `config`.
///
/// With `require_provider`, a backend without an API key is an error here
/// rather than a degraded result later.
pub async fn build_pipeline(
    config: &InkwellConfig,
    require_provider: bool,
) -> anyhow::Result<LetterPipeline> {
    let llm = provider(config);
    if require_provider && !llm.is_available() {
        anyhow::bail!(
            "{} provider is not configured; set {} in the environment or .env",
            llm.name(),
            api_key_var(config.provider)
        );
    }

    let store = FileStore::open(&config.store_path)
        .await
        .with_context(|| format!("failed to open store {}", config.store_path.display()))?;
    info!("Using {} store at {}", store.name(), config.store_path.display());

    LetterPipeline::with_config(llm, Arc::new(store), config.pipeline.clone())
        .context("invalid pipeline configuration")
}

fn provider(config: &InkwellConfig) -> Arc<dyn GenerationProvider> {
    match config.provider {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new();
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(model) = &config.generation_model {
                provider = provider.with_generation_model(model);
            }
            if let Some(model) = &config.embedding_model {
                provider = provider.with_embedding_model(model);
            }
            Arc::new(provider)
        }
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new();
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            if let Some(model) = &config.generation_model {
                provider = provider.with_chat_model(model);
            }
            if let Some(model) = &config.embedding_model {
                provider = provider.with_embedding_model(model);
            }
            Arc::new(provider)
        }
    }
}

fn api_key_var(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::OpenAi => "OPENAI_API_KEY",
    }
}

/// Run `command` and return its JSON output.
pub async fn execute(pipeline: &LetterPipeline, command: &Command) -> anyhow::Result<Value> {
    match command {
        Command::IngestText { text, source } => {
            let outcome = pipeline
                .ingest_sample(text, Some(metadata([(SOURCE_KEY, source.as_str())])))
                .await;
            Ok(ingest_response(&outcome))
        }
        Command::IngestDir { dir } => {
            let exists = tokio::fs::try_exists(dir)
                .await
                .with_context(|| format!("failed to inspect {}", dir.display()))?;
            if !exists {
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                info!("Created sample directory {}", dir.display());
                return Ok(json!({
                    "status": "created",
                    "dir": dir,
                    "message": "Add .txt, .jpg, .jpeg or .png samples here and run ingest-dir again.",
                }));
            }

            let report = BulkIngestor::new(pipeline)
                .ingest_dir(dir)
                .await
                .with_context(|| format!("failed to ingest {}", dir.display()))?;
            Ok(serde_json::to_value(report)?)
        }
        Command::Generate { prompt, no_learn } => {
            let outcome = pipeline.generate_letter(prompt, !no_learn).await;
            Ok(serde_json::to_value(outcome)?)
        }
        Command::Stats => {
            let samples = pipeline
                .store()
                .count()
                .await
                .context("failed to count samples")?;
            Ok(json!({
                "store": pipeline.store().name(),
                "provider": pipeline.generation().name(),
                "samples": samples,
            }))
        }
    }
}

fn ingest_response(outcome: &IngestOutcome) -> Value {
    match outcome {
        IngestOutcome::Stored { id } => json!({ "status": "success", "doc_id": id }),
        IngestOutcome::Unindexed { id, reason } => {
            json!({ "status": "unindexed", "doc_id": id, "reason": reason })
        }
        IngestOutcome::Rejected { reason } => {
            json!({ "status": "rejected", "doc_id": null, "reason": reason })
        }
    }
}
