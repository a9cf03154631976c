//! OpenAI-compatible provider (chat completions + embeddings).

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{ProviderError, Result};
use crate::generation::{GenerationProvider, GenerationRequest};
use crate::http::error_for_status;

/// OpenAI generation and embedding provider.
///
/// Works against any server exposing `/chat/completions` and `/embeddings`.
pub struct OpenAiProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Chat model.
    chat_model: String,

    /// Embedding model.
    embedding_model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider, reading `OPENAI_API_KEY` from the environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
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

    /// Set the chat model.
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
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

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_text(&self, request: GenerationRequest) -> Result<String> {
        let api_key = self.api_key()?;

        let user_content = if request.attachments.is_empty() {
            json!(request.user_instruction)
        } else {
            let mut parts = vec![json!({"type": "text", "text": request.user_instruction})];
            for attachment in &request.attachments {
                let url = format!(
                    "data:{};base64,{}",
                    attachment.mime_type,
                    BASE64.encode(&attachment.data)
                );
                parts.push(json!({"type": "image_url", "image_url": {"url": url}}));
            }
            json!(parts)
        };

        let body = json!({
            "model": self.chat_model,
            "messages": [
                {"role": "system", "content": request.system_instruction},
                {"role": "user", "content": user_content}
            ]
        });

        debug!("Generating text with model: {}", self.chat_model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let result: ChatCompletionResponse = response.json().await?;
        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("No completion in response".to_string()))?;

        info!("Generated {} characters", text.chars().count());
        Ok(text)
    }

    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.api_key()?;

        debug!("Generating embedding with model: {}", self.embedding_model);

        let body = json!({
            "input": text,
            "model": self.embedding_model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let result: EmbeddingResponse = response.json().await?;
        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No embedding in response".to_string()))?
            .embedding;

        info!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new()
            .with_api_key("sk-test")
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_generate_text_uses_system_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "system", "content": "ghostwriter"},
                    {"role": "user", "content": "write a thank-you note"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Thank you kindly."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server)
            .generate_text(GenerationRequest::new(
                "ghostwriter",
                "write a thank-you note",
            ))
            .await
            .unwrap();

        assert_eq!(text, "Thank you kindly.");
    }

    #[tokio::test]
    async fn test_embed_text_reads_first_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.5, -0.5], "index": 0}],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let embedding = provider(&server).embed_text("Dear Madam").await.unwrap();

        assert_eq!(embedding, vec![0.5, -0.5]);
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate_text(GenerationRequest::new("s", "u"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
