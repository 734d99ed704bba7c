mod snapshot;
mod types;

pub use snapshot::SnapshotStore;
pub use types::{NewEntry, SearchHit, StoreStats, VectorEntry};

use async_trait::async_trait;

use crate::error::Result;
use crate::ingest::{Metadata, SourceType};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Stores one vector and returns its new id.
    async fn add(&self, text: String, vector: Vec<f32>, metadata: Metadata) -> Result<String>;

    /// Stores all entries or none, returning ids in input order.
    async fn add_batch(&self, entries: Vec<NewEntry>) -> Result<Vec<String>>;

    /// Top `top_k` entries by cosine similarity to `query`, best first.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        source_type: Option<SourceType>,
    ) -> Result<Vec<SearchHit>>;

    /// Returns whether an entry was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
    async fn get(&self, id: &str) -> Result<Option<VectorEntry>>;
    async fn stats(&self) -> Result<StoreStats>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Cosine of the angle between `a` and `b`; 0.0 when either is a zero
/// vector or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
