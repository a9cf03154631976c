//! JSON-file-backed similarity store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::sample::{QueryResult, Sample};
use crate::store::SimilarityStore;

/// A [`MemoryStore`] persisted to a single JSON snapshot.
///
/// The snapshot is loaded on open and rewritten atomically (temp file +
/// rename) after every mutating call. A mutation whose snapshot cannot be
/// written is rolled back, so memory never holds what the file does not.
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,

    /// Serialises mutate-then-save so snapshots are written in order.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) a store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let memory = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let samples: Vec<Sample> = serde_json::from_str(&content)?;
            MemoryStore::from_samples(samples)?
        } else {
            info!("No snapshot at {}, starting empty", path.display());
            MemoryStore::new()
        };

        Ok(Self {
            path,
            memory,
            write_lock: Mutex::new(()),
        })
    }

    async fn save(&self) -> Result<()> {
        let samples = self.memory.snapshot().await;
        let content = serde_json::to_string_pretty(&samples)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} samples to {}", samples.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SimilarityStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn add(&self, sample: Sample) -> Result<()> {
        if sample.embedding.is_empty() {
            return self.memory.add(sample).await;
        }

        let _guard = self.write_lock.lock().await;
        let checkpoint = self.memory.checkpoint().await;
        self.memory.add(sample).await?;
        if let Err(err) = self.save().await {
            warn!("Rolling back add: {err}");
            self.memory.rollback(checkpoint).await;
            return Err(err);
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        self.memory.query(vector, top_k).await
    }

    async fn count(&self) -> Result<usize> {
        self.memory.count().await
    }

    async fn prune(&self, source: &str, keep: usize) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let checkpoint = self.memory.checkpoint().await;
        let removed = self.memory.prune(source, keep).await?;
        if removed == 0 {
            return Ok(0);
        }
        if let Err(err) = self.save().await {
            warn!("Rolling back prune: {err}");
            self.memory.rollback(checkpoint).await;
            return Err(err);
        }
        Ok(removed)
    }
}
