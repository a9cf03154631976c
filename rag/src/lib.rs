//! # Letter Pipeline
//!
//! Retrieval-augmented generation of letters that imitate a stored writing
//! style, with an optional feedback loop that stores each generated letter
//! as a future sample.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Letter Pipeline                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   prompt ──► embed ──► query store ──► render SAMPLE blocks     │
//! │                                              │                   │
//! │                                              ▼                   │
//! │   LetterOutcome ◄── feedback ingest ◄── generate                │
//! │                                                                  │
//! │   GenerationProvider            SimilarityStore                 │
//! │   (Gemini, OpenAI)              (Memory, File)                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use inkwell_providers::{FileStore, GeminiProvider};
//! use inkwell_rag::LetterPipeline;
//!
//! let pipeline = LetterPipeline::new(
//!     Arc::new(GeminiProvider::new()),
//!     Arc::new(FileStore::open("gold/samples.json").await?),
//! );
//!
//! let outcome = pipeline.generate_letter("Thank my aunt for the scarf", true).await;
//! println!("{}", outcome.result);
//! ```

pub mod bulk;
pub mod config;
pub mod error;
pub mod outcome;
pub mod pipeline;

pub use bulk::{BulkIngestor, BulkReport, FileReport, FileStatus};
pub use config::{PipelineConfig, RetentionPolicy};
pub use error::{RagError, Result};
pub use outcome::{Degradation, IngestOutcome, LetterOutcome};
pub use pipeline::{AI_GENERATED_SOURCE, GENERATION_FAILURE_PREFIX, LetterPipeline};

// Re-export from dependencies for convenience
pub use inkwell_providers::{GenerationProvider, Metadata, SimilarityStore};
pub use tokio_util::sync::CancellationToken;
