//! Data types for chunks and retrieval candidates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A token-windowed segment of a source document.
///
/// `chunk_id` is sequential per `doc_id` starting at 0, and `(doc_id, chunk_id)`
/// is the unique identity of a chunk everywhere in the pipeline. The chunker
/// produces chunks with an empty embedding; the pipeline attaches embeddings
/// before storing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the source document.
    pub doc_id: String,
    /// Sequential index of this chunk within the document.
    pub chunk_id: u32,
    /// The text content of the chunk.
    pub content: String,
    /// The vector embedding for this chunk's content.
    pub embedding: Vec<f32>,
    /// Key-value metadata (`authors`, `year`, `title`, `source`).
    pub metadata: HashMap<String, String>,
}

/// A stored [`Chunk`] paired with a similarity score, as returned by a
/// vector store backend.
///
/// The score is `1 - cosine_distance` to the query vector; higher is more
/// similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A retrieval candidate flowing through the rerank and generation stages.
///
/// Reranking reorders values of this type and may revise `score`; the
/// `(doc_id, chunk_id)` identity never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Identifier of the source document.
    pub doc_id: String,
    /// Sequential index of the chunk within the document.
    pub chunk_id: u32,
    /// The text content of the chunk.
    pub content: String,
    /// The similarity score, possibly revised by reranking.
    pub score: f32,
    /// Key-value metadata carried from the stored chunk.
    pub metadata: HashMap<String, String>,
}

impl RetrievedChunk {
    /// The reference token used to tag this chunk in prompts and answers.
    pub fn reference(&self) -> String {
        format!("{}#{}", self.doc_id, self.chunk_id)
    }
}

impl From<SearchResult> for RetrievedChunk {
    fn from(result: SearchResult) -> Self {
        RetrievedChunk {
            doc_id: result.chunk.doc_id,
            chunk_id: result.chunk.chunk_id,
            content: result.chunk.content,
            score: result.score,
            metadata: result.chunk.metadata,
        }
    }
}
