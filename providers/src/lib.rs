//! # Providers
//!
//! Capability contracts for the Inkwell letter engine, plus the concrete
//! backends that implement them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Capabilities                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  GenerationProvider ──► text / Embedding                        │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  GeminiProvider, OpenAiProvider                                 │
//! │                                                                 │
//! │  SimilarityStore ──► Sample / QueryResult                       │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  MemoryStore, FileStore                                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod file;
pub mod gemini;
pub mod generation;
mod http;
pub mod memory;
pub mod openai;
pub mod sample;
pub mod similarity;
pub mod store;

pub use error::{ProviderError, Result};
pub use file::FileStore;
pub use gemini::GeminiProvider;
pub use generation::{Attachment, GenerationProvider, GenerationRequest};
pub use memory::MemoryStore;
pub use openai::OpenAiProvider;
pub use sample::{
    Metadata, MetadataValue, QueryResult, SOURCE_KEY, Sample, TRIGGER_PROMPT_KEY, metadata,
};
pub use similarity::{cosine_distance, cosine_similarity};
pub use store::SimilarityStore;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
