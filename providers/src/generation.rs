//! Text generation and embedding capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::Result;

/// A binary attachment sent alongside a generation request (usually an image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,

    /// Raw bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create a new attachment.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Request for generating text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Framing instruction for the model.
    pub system_instruction: String,

    /// The user turn.
    pub user_instruction: String,

    /// Optional attachments.
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    /// Create a new generation request.
    pub fn new(system_instruction: impl Into<String>, user_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_instruction: user_instruction.into(),
            attachments: Vec::new(),
        }
    }

    /// Add an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Trait for generation backends.
///
/// Implementors turn instructions into text and text into fixed-length
/// vectors. Backend failures are returned as [`crate::ProviderError`]; callers
/// decide how to degrade.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate text for the given request.
    async fn generate_text(&self, request: GenerationRequest) -> Result<String>;

    /// Embed `text`.
    ///
    /// Empty or whitespace-only input yields an empty vector without
    /// contacting the backend.
    async fn embed_text(&self, text: &str) -> Result<Embedding>;

    /// Check if the provider is usable (API key set, etc.).
    fn is_available(&self) -> bool;
}
