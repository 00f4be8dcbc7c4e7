//! LLM-based reranking of retrieved candidates.
//!
//! The rerank stage may only reorder: its output has the same length and the
//! same member set as its input. A malformed model response degrades to the
//! retrieval order instead of failing the request.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::document::RetrievedChunk;
use crate::error::Result;
use crate::llm::CompletionProvider;
use crate::retry::{RetryPolicy, with_retry};

/// A reranker that re-scores and reorders retrieval candidates.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank `candidates` for `query`, reordering only.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievedChunk>,
    ) -> Result<Vec<RetrievedChunk>>;
}

const RERANK_MAX_TOKENS: u32 = 1024;
const RERANK_TEMPERATURE: f32 = 0.0;

/// Reranks candidates with one structured LLM judgment call.
///
/// All candidates go into a single prompt; the model responds with a JSON
/// object `{"ranking": [{"doc_id", "chunk_id", "score"}]}`. Candidates the
/// model omits keep their similarity score, so every candidate always has a
/// resolved score even under partial output.
pub struct LlmReranker {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct RankingResponse {
    #[serde(default)]
    ranking: Vec<RankingEntry>,
}

#[derive(Deserialize)]
struct RankingEntry {
    doc_id: String,
    chunk_id: u32,
    #[serde(default)]
    score: f32,
}

impl LlmReranker {
    /// Create a reranker over `provider` with the given retry policy.
    pub fn new(provider: Arc<dyn CompletionProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    fn build_prompt(query: &str, candidates: &[RetrievedChunk]) -> String {
        let passages = json!(
            candidates
                .iter()
                .map(|c| {
                    json!({
                        "doc_id": c.doc_id,
                        "chunk_id": c.chunk_id,
                        "content": c.content,
                    })
                })
                .collect::<Vec<_>>()
        );
        format!(
            "You rank document passages by their relevance to a question. Respond with a \
             single JSON object with the key `ranking`, whose value is a list of objects of \
             the form {{\"doc_id\": str, \"chunk_id\": int, \"score\": float}}. Higher scores \
             are more relevant. Output only the JSON object.\n\
             \n\
             Question:\n{query}\n\
             \n\
             Passages:\n{passages}"
        )
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievedChunk>,
    ) -> Result<Vec<RetrievedChunk>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let prompt = Self::build_prompt(query, &candidates);
        let response = with_retry(&self.retry, "rerank", || {
            self.provider.complete(&prompt, RERANK_MAX_TOKENS, RERANK_TEMPERATURE)
        })
        .await?;

        let parsed: RankingResponse = match serde_json::from_str(&response) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "rerank response was not valid JSON, keeping retrieval order");
                return Ok(candidates);
            }
        };

        let scores: HashMap<(String, u32), f32> = parsed
            .ranking
            .into_iter()
            .map(|entry| ((entry.doc_id, entry.chunk_id), entry.score))
            .collect();

        // Resolve a score for every candidate, then sort descending. The sort
        // is stable: ties keep their pre-rerank relative order.
        let mut paired: Vec<(f32, RetrievedChunk)> = candidates
            .into_iter()
            .map(|candidate| {
                let resolved = scores
                    .get(&(candidate.doc_id.clone(), candidate.chunk_id))
                    .copied()
                    .unwrap_or(candidate.score);
                (resolved, candidate)
            })
            .collect();
        paired.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        debug!(candidates = paired.len(), scored = scores.len(), "rerank completed");
        Ok(paired.into_iter().map(|(_, candidate)| candidate).collect())
    }
}
