//! Gemini (Generative Language API) provider.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{ProviderError, Result};
use crate::generation::{GenerationProvider, GenerationRequest};
use crate::http::error_for_status;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Gemini generation and embedding provider.
pub struct GeminiProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model used for `generateContent`.
    generation_model: String,

    /// Model used for `embedContent`.
    embedding_model: String,
}

impl GeminiProvider {
    /// Create a new provider, reading `GEMINI_API_KEY` from the environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the generation model.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::not_configured(self.name()))
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, request: GenerationRequest) -> Result<String> {
        let api_key = self.api_key()?;

        let mut parts = vec![Part::Text {
            text: format!(
                "SYSTEM: {}\n\nUSER: {}",
                request.system_instruction, request.user_instruction
            ),
        }];
        for attachment in &request.attachments {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: attachment.mime_type.clone(),
                    data: BASE64.encode(&attachment.data),
                },
            });
        }

        debug!(
            "Generating text with model: {} ({} attachments)",
            self.generation_model,
            request.attachments.len()
        );

        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.generation_model
            ))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let result: GenerateContentResponse = response.json().await?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No candidate text in response".to_string(),
            ));
        }

        info!("Generated {} characters", text.chars().count());
        Ok(text)
    }

    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.api_key()?;

        debug!("Generating embedding with model: {}", self.embedding_model);

        let body = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: EmbedContent {
                parts: vec![TextPart { text }],
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:embedContent",
                self.base_url, self.embedding_model
            ))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let result: EmbedContentResponse = response.json().await?;
        let embedding = result
            .embedding
            .ok_or_else(|| ProviderError::InvalidResponse("No embedding in response".to_string()))?
            .values;

        info!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
