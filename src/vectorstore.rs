//! Vector store trait for persisting and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// Chunks are keyed by `(doc_id, chunk_id)`. Upserting is replace-on-conflict,
/// so re-ingesting a document overwrites its chunks instead of duplicating
/// them, and concurrent re-ingestion of the same document is safe.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks by their `(doc_id, chunk_id)` key.
    ///
    /// Chunks must have embeddings attached.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return the `k` stored chunks most similar to `embedding`, ordered by
    /// descending similarity score (`1 - cosine_distance`).
    ///
    /// `k == 0` yields an empty result; `k` larger than the stored count
    /// yields every stored chunk.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// The number of stored chunks.
    async fn count(&self) -> Result<usize>;
}
