//! Test doubles for the letter pipeline.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inkwell_providers::{
    Embedding, GenerationProvider, GenerationRequest, MemoryStore, ProviderError, QueryResult,
    Result, Sample, SimilarityStore,
};
use tokio_util::sync::CancellationToken;

/// How the scripted provider answers embedding calls.
#[derive(Debug, Clone)]
pub enum EmbedBehavior {
    /// Always return this vector.
    Fixed(Embedding),
    /// Return an empty vector.
    Empty,
    /// Fail with an API error.
    Fail,
}

/// How the scripted provider answers generation calls.
#[derive(Debug, Clone)]
pub enum GenerateBehavior {
    /// Reply with this text.
    Reply(String),
    /// Fail with an API error.
    Fail(String),
    /// Never finish in test time.
    Hang,
}

/// A generation provider with canned answers that records every call.
pub struct ScriptedProvider {
    pub embed: EmbedBehavior,
    pub generate: GenerateBehavior,
    pub embed_calls: Mutex<Vec<String>>,
    pub generate_calls: Mutex<Vec<GenerationRequest>>,
    /// Cancelled right after a generation call returns.
    pub cancel_after_generate: Option<CancellationToken>,
}

impl ScriptedProvider {
    pub fn new(embed: EmbedBehavior, generate: GenerateBehavior) -> Self {
        Self {
            embed,
            generate,
            embed_calls: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(Vec::new()),
            cancel_after_generate: None,
        }
    }

    /// Embeds everything as `[1, 0, 0]` and replies with `reply`.
    pub fn replying(reply: &str) -> Self {
        Self::new(
            EmbedBehavior::Fixed(vec![1.0, 0.0, 0.0]),
            GenerateBehavior::Reply(reply.to_string()),
        )
    }

    pub fn embed_calls(&self) -> Vec<String> {
        self.embed_calls.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> Vec<GenerationRequest> {
        self.generate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, request: GenerationRequest) -> Result<String> {
        self.generate_calls.lock().unwrap().push(request);

        let reply = match &self.generate {
            GenerateBehavior::Reply(text) => Ok(text.clone()),
            GenerateBehavior::Fail(message) => Err(ProviderError::ApiRequest(message.clone())),
            GenerateBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        };

        if let Some(token) = &self.cancel_after_generate {
            token.cancel();
        }
        reply
    }

    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        self.embed_calls.lock().unwrap().push(text.to_string());

        match &self.embed {
            EmbedBehavior::Fixed(vector) => Ok(vector.clone()),
            EmbedBehavior::Empty => Ok(Vec::new()),
            EmbedBehavior::Fail => Err(ProviderError::ApiRequest("embedding backend down".into())),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// A store that records every call, backed by a real [`MemoryStore`] unless
/// canned query results are supplied.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub canned: Option<Vec<QueryResult>>,
    pub fail_query: bool,
    pub added: Mutex<Vec<Sample>>,
    pub queries: Mutex<Vec<(Vec<f32>, usize)>>,
    pub prunes: Mutex<Vec<(String, usize)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canned(results: Vec<QueryResult>) -> Self {
        Self {
            canned: Some(results),
            ..Self::default()
        }
    }

    pub fn added(&self) -> Vec<Sample> {
        self.added.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(Vec<f32>, usize)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn prunes(&self) -> Vec<(String, usize)> {
        self.prunes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn add(&self, sample: Sample) -> Result<()> {
        self.added.lock().unwrap().push(sample.clone());
        self.inner.add(sample).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        self.queries.lock().unwrap().push((vector.to_vec(), top_k));

        if self.fail_query {
            return Err(ProviderError::Store("index unavailable".into()));
        }
        match &self.canned {
            Some(results) => Ok(results.iter().take(top_k).cloned().collect()),
            None => self.inner.query(vector, top_k).await,
        }
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn prune(&self, source: &str, keep: usize) -> Result<usize> {
        self.prunes.lock().unwrap().push((source.to_string(), keep));
        self.inner.prune(source, keep).await
    }
}

/// A canned query hit.
pub fn hit(id: &str, text: &str, distance: f32) -> QueryResult {
    QueryResult {
        id: id.to_string(),
        text: text.to_string(),
        metadata: Default::default(),
        distance,
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
