//! Similarity store capability.

use async_trait::async_trait;

use crate::error::Result;
use crate::sample::{QueryResult, Sample};

/// Trait for similarity stores.
///
/// A store keeps `(id, text, embedding, metadata)` tuples and answers
/// nearest-neighbour queries. Contract shared by every implementor:
///
/// - `add` with an empty embedding is a logged no-op, not an error.
/// - `query` with an empty vector (or `top_k == 0`) returns no results.
/// - `query` results are ascending by distance and never longer than `top_k`.
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Get the name of this store.
    fn name(&self) -> &str;

    /// Insert or replace a sample by id.
    async fn add(&self, sample: Sample) -> Result<()>;

    /// Return the samples nearest to `vector`.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>>;

    /// Number of stored samples.
    async fn count(&self) -> Result<usize>;

    /// Delete the oldest samples tagged with `source` until at most `keep` remain.
    ///
    /// Returns the number of samples removed.
    async fn prune(&self, source: &str, keep: usize) -> Result<usize>;
}
