//! Retrieval stage: similarity search shaped into ranked candidates.

use std::sync::Arc;

use tracing::debug;

use crate::document::RetrievedChunk;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Issues similarity queries against the vector store and normalizes the raw
/// rows into [`RetrievedChunk`] candidates.
///
/// The nearest-neighbor computation itself is the store's job; the retriever
/// only shapes results and enforces the `k` bound.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    default_k: usize,
}

impl Retriever {
    /// Create a new retriever over `store` with a configured default width.
    pub fn new(store: Arc<dyn VectorStore>, default_k: usize) -> Self {
        Self { store, default_k }
    }

    /// Return at most `k` candidates in descending similarity order.
    ///
    /// `k = None` uses the configured default width; `k = Some(0)` yields an
    /// empty result without touching the store.
    pub async fn search(
        &self,
        embedding: &[f32],
        k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        let k = k.unwrap_or(self.default_k);
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = self.store.search(embedding, k).await?;
        debug!(requested = k, returned = rows.len(), "similarity search completed");
        Ok(rows.into_iter().map(RetrievedChunk::from).collect())
    }
}
