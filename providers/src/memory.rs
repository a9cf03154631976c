//! In-process similarity store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::sample::{QueryResult, Sample};
use crate::similarity::nearest;
use crate::store::SimilarityStore;

#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    /// Samples in insertion order.
    samples: Vec<Sample>,

    /// Shared embedding dimension, fixed by the first sample when unset.
    dimension: Option<usize>,
}

impl StoreState {
    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(ProviderError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn upsert(&mut self, sample: Sample) {
        self.dimension.get_or_insert(sample.embedding.len());
        match self.samples.iter_mut().find(|s| s.id == sample.id) {
            Some(existing) => *existing = sample,
            None => self.samples.push(sample),
        }
    }
}

/// A brute-force cosine-distance store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Create an empty store; the dimension is taken from the first sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts `dimension`-length embeddings.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            state: RwLock::new(StoreState {
                samples: Vec::new(),
                dimension: Some(dimension),
            }),
        }
    }

    /// Build a store from existing samples, validating that dimensions agree.
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        let mut state = StoreState::default();
        for sample in samples {
            if sample.embedding.is_empty() {
                warn!("Dropping sample {} with empty embedding", sample.id);
                continue;
            }
            state.check_dimension(sample.embedding.len())?;
            state.upsert(sample);
        }

        info!("Loaded {} samples into memory store", state.samples.len());
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Copy of every stored sample, in insertion order.
    pub async fn snapshot(&self) -> Vec<Sample> {
        self.state.read().await.samples.clone()
    }

    /// Get a sample by id.
    pub async fn get(&self, id: &str) -> Option<Sample> {
        self.state
            .read()
            .await
            .samples
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// The embedding dimension, once known.
    pub async fn dimension(&self) -> Option<usize> {
        self.state.read().await.dimension
    }

    /// Copy of the full state, for [`Self::rollback`].
    pub(crate) async fn checkpoint(&self) -> StoreState {
        self.state.read().await.clone()
    }

    /// Restore a state taken by [`Self::checkpoint`].
    pub(crate) async fn rollback(&self, checkpoint: StoreState) {
        *self.state.write().await = checkpoint;
    }
}

#[async_trait]
impl SimilarityStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn add(&self, sample: Sample) -> Result<()> {
        if sample.embedding.is_empty() {
            warn!("Skipping sample {} due to empty embedding", sample.id);
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.check_dimension(sample.embedding.len())?;
        debug!("Stored sample: {}", sample.id);
        state.upsert(sample);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        if vector.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let state = self.state.read().await;
        state.check_dimension(vector.len())?;

        let ranked = nearest(
            vector,
            state.samples.iter().map(|s| s.embedding.as_slice()),
            top_k,
        )?;

        Ok(ranked
            .into_iter()
            .map(|(i, distance)| {
                let sample = &state.samples[i];
                QueryResult {
                    id: sample.id.clone(),
                    text: sample.text.clone(),
                    metadata: sample.metadata.clone(),
                    distance,
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.samples.len())
    }

    async fn prune(&self, source: &str, keep: usize) -> Result<usize> {
        let mut state = self.state.write().await;

        // Insertion position breaks ties between equal timestamps.
        let mut tagged: Vec<(chrono::DateTime<chrono::Utc>, usize, String)> = state
            .samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.source() == Some(source))
            .map(|(position, s)| (s.created_at, position, s.id.clone()))
            .collect();

        if tagged.len() <= keep {
            return Ok(0);
        }

        tagged.sort();
        let excess = tagged.len() - keep;
        let doomed: Vec<String> = tagged
            .into_iter()
            .take(excess)
            .map(|(_, _, id)| id)
            .collect();
        state.samples.retain(|s| !doomed.contains(&s.id));

        info!("Pruned {excess} samples with source {source}");
        Ok(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{SOURCE_KEY, metadata};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn sample(id: &str, embedding: Vec<f32>) -> Sample {
        Sample::new(id, format!("text of {id}"), embedding, metadata([(SOURCE_KEY, "manual")]))
    }

    #[tokio::test]
    async fn test_query_ranks_by_distance() {
        let store = MemoryStore::new();
        store.add(sample("far", vec![0.0, 1.0, 0.0])).await.unwrap();
        store.add(sample("near", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.add(sample("mid", vec![0.7, 0.7, 0.0])).await.unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["near", "mid"]);
        assert!(results[0].distance <= results[1].distance);
        assert!(results.iter().all(|r| r.distance >= 0.0));
    }

    #[tokio::test]
    async fn test_empty_embedding_is_not_stored() {
        let store = MemoryStore::new();
        store.add(sample("empty", Vec::new())).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.dimension().await, None);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let store = MemoryStore::new();
        store.add(sample("a", vec![1.0, 0.0])).await.unwrap();

        assert!(store.query(&[], 3).await.unwrap().is_empty());
        assert!(store.query(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_is_fixed_by_first_sample() {
        let store = MemoryStore::new();
        store.add(sample("a", vec![1.0, 0.0])).await.unwrap();

        let err = store.add(sample("b", vec![1.0, 0.0, 0.0])).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert!(store.query(&[1.0, 0.0, 0.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn test_add_upserts_by_id() {
        let store = MemoryStore::with_dimension(2);
        store.add(sample("a", vec![1.0, 0.0])).await.unwrap();
        store.add(sample("a", vec![0.0, 1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("a").await.unwrap();
        assert_eq!(stored.embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_prune_removes_oldest_of_source_only() {
        let store = MemoryStore::new();
        let now = Utc::now();

        for (i, id) in ["g1", "g2", "g3"].iter().enumerate() {
            let mut s = Sample::new(
                *id,
                "generated letter",
                vec![1.0, 0.0],
                metadata([(SOURCE_KEY, "ai_generated")]),
            );
            s.created_at = now + Duration::seconds(i as i64);
            store.add(s).await.unwrap();
        }
        store.add(sample("manual", vec![0.0, 1.0])).await.unwrap();

        let removed = store.prune("ai_generated", 1).await.unwrap();

        assert_eq!(removed, 2);
        assert!(store.get("g3").await.is_some());
        assert!(store.get("g1").await.is_none());
        assert!(store.get("manual").await.is_some());
        assert_eq!(store.prune("ai_generated", 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prune_ties_keep_latest_inserted() {
        let store = MemoryStore::new();
        let now = Utc::now();

        for id in ["first", "second", "third"] {
            let mut s = Sample::new(
                id,
                "generated letter",
                vec![1.0, 0.0],
                metadata([(SOURCE_KEY, "ai_generated")]),
            );
            s.created_at = now;
            store.add(s).await.unwrap();
        }

        assert_eq!(store.prune("ai_generated", 1).await.unwrap(), 2);
        assert!(store.get("third").await.is_some());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rollback_restores_samples_and_dimension() {
        let store = MemoryStore::new();
        let checkpoint = store.checkpoint().await;

        store.add(sample("a", vec![1.0, 0.0])).await.unwrap();
        store.rollback(checkpoint).await;

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.dimension().await, None);
    }
}
