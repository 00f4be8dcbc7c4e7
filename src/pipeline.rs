//! The pipeline orchestrator.
//!
//! [`RagPipeline`] composes the chunker, embedding provider, vector store,
//! optional reranker, and generator into three workflows:
//!
//! - [`ingest`](RagPipeline::ingest) — chunk → embed → upsert
//! - [`answer`](RagPipeline::answer) — embed → retrieve → rerank → generate
//! - [`draft_section`](RagPipeline::draft_section) — embed → retrieve →
//!   rerank → cite → generate → reference list
//!
//! Every stage runs strictly in sequence. Provider handles are constructed
//! once and injected through the builder, then shared by reference.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scholar_rag::{InMemoryVectorStore, OpenAiEmbeddings, PipelineConfig, RagPipeline};
//!
//! let config = PipelineConfig::builder().build()?;
//! let provider = scholar_rag::provider_from_backend(config.generation_backend)?;
//! let pipeline = RagPipeline::builder()
//!     .config(config)
//!     .embedding_provider(Arc::new(OpenAiEmbeddings::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .completion_provider(provider)
//!     .build()?;
//!
//! pipeline.ingest("paper1", &markdown_text).await?;
//! let answer = pipeline.answer("What does the paper claim?").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunking::SentenceWindowChunker;
use crate::citation::{Citation, build_reference_list};
use crate::config::PipelineConfig;
use crate::document::{Chunk, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{CompletionProvider, Generator};
use crate::rerank::Reranker;
use crate::retrieval::Retriever;
use crate::retry::with_retry;
use crate::sections::SectionKind;
use crate::vectorstore::VectorStore;

/// Number of top-ranked chunks fed to answer generation.
const ANSWER_CONTEXT_CHUNKS: usize = 3;

const NO_MATCH_ANSWER: &str = "No matching documents were found for this question.";
const NO_LITERATURE_DRAFT: &str = "No matching documents for this topic are available in the \
database. Ingest relevant scientific literature first.";

/// A generated answer with its full audit trail of sources.
///
/// `sources` always contains every candidate that survived retrieval, in
/// final ranked order, even though only the top few were passed to
/// generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// The full post-rerank candidate list.
    pub sources: Vec<RetrievedChunk>,
}

/// A generated paper section with citations and a reference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDraft {
    /// The generated section text.
    pub text: String,
    /// One citation per source included in the generation context.
    pub citations: Vec<Citation>,
    /// The rendered Harvard reference list (empty when no citations exist).
    pub reference_list: String,
    /// The full post-rerank candidate list.
    pub sources: Vec<RetrievedChunk>,
}

/// The pipeline orchestrator. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: PipelineConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: SentenceWindowChunker,
    retriever: Retriever,
    reranker: Option<Arc<dyn Reranker>>,
    generator: Generator,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The number of chunks currently stored.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Ingest a document: chunk → embed → upsert.
    ///
    /// Re-ingesting the same `doc_id` overwrites its chunks by key.
    pub async fn ingest(&self, doc_id: &str, text: &str) -> Result<Vec<Chunk>> {
        self.ingest_with_metadata(doc_id, text, HashMap::new()).await
    }

    /// Ingest a document with caller-supplied metadata (`authors`, `year`,
    /// `title`) attached to every chunk for later citation.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] for empty text; embedding failures
    /// propagate after the retry budget is exhausted.
    pub async fn ingest_with_metadata(
        &self,
        doc_id: &str,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(doc_id, text)?;

        for chunk in &mut chunks {
            chunk.metadata.insert("source".to_string(), doc_id.to_string());
            chunk.metadata.extend(metadata.clone());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = with_retry(&self.config.retry, "embed chunks", || {
            self.embedding_provider.embed_batch(&texts)
        })
        .await?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.store.upsert(&chunks).await?;

        info!(doc_id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Answer a question from the indexed corpus.
    ///
    /// An empty retrieval yields a canned no-match answer with empty sources
    /// and never calls the generation provider.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let query_embedding = with_retry(&self.config.retry, "embed query", || {
            self.embedding_provider.embed(question)
        })
        .await?;

        let retrieved = self.retriever.search(&query_embedding, None).await?;
        if retrieved.is_empty() {
            info!("no matching chunks for question");
            return Ok(Answer { text: NO_MATCH_ANSWER.to_string(), sources: Vec::new() });
        }

        let ranked = self.rerank_stage(question, retrieved).await?;

        let context_len = ranked.len().min(ANSWER_CONTEXT_CHUNKS);
        let text = self.generator.answer(question, &ranked[..context_len]).await?;

        info!(sources = ranked.len(), context_chunks = context_len, "answered question");
        Ok(Answer { text, sources: ranked })
    }

    /// Draft a scientific paper section about `topic` with Harvard citations.
    ///
    /// `num_sources` bounds both retrieval and the cited generation context;
    /// `None` uses the configured default. An empty retrieval yields a canned
    /// no-literature draft without calling the generation provider.
    pub async fn draft_section(
        &self,
        kind: SectionKind,
        topic: &str,
        num_sources: Option<usize>,
    ) -> Result<SectionDraft> {
        let requested = num_sources.unwrap_or(self.config.num_sources);

        let topic_embedding = with_retry(&self.config.retry, "embed topic", || {
            self.embedding_provider.embed(topic)
        })
        .await?;

        let retrieved = self.retriever.search(&topic_embedding, Some(requested)).await?;
        if retrieved.is_empty() {
            info!(section = %kind, "no literature found for topic");
            return Ok(SectionDraft {
                text: NO_LITERATURE_DRAFT.to_string(),
                citations: Vec::new(),
                reference_list: String::new(),
                sources: Vec::new(),
            });
        }

        let ranked = self.rerank_stage(topic, retrieved).await?;

        let mut citations = Vec::new();
        let mut context_parts = Vec::new();
        for (idx, chunk) in ranked.iter().take(requested).enumerate() {
            let citation = Citation::for_chunk(chunk);
            context_parts.push(format!(
                "[Source {}: {}]\n{}\n",
                idx + 1,
                citation.in_text(),
                chunk.content
            ));
            citations.push(citation);
        }
        let context = context_parts.join("\n");

        let text = self.generator.section(kind, topic, &context).await?;
        let reference_list = build_reference_list(&citations);

        info!(section = %kind, sources = ranked.len(), cited = citations.len(), "drafted section");
        Ok(SectionDraft { text, citations, reference_list, sources: ranked })
    }

    /// Run the optional rerank stage; without a reranker the retrieval order
    /// passes through unchanged.
    async fn rerank_stage(
        &self,
        query: &str,
        candidates: Vec<RetrievedChunk>,
    ) -> Result<Vec<RetrievedChunk>> {
        match &self.reranker {
            Some(reranker) => reranker.rerank(query, candidates).await,
            None => Ok(candidates),
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, `vector_store`, and `completion_provider`
/// are required; `reranker` is optional and only takes effect when the
/// configuration enables reranking.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<PipelineConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set an optional reranker for post-retrieval reordering.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the completion provider used for generation.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let completion_provider = self
            .completion_provider
            .ok_or_else(|| RagError::Config("completion_provider is required".to_string()))?;

        let reranker = if config.rerank_enabled { self.reranker } else { None };
        let chunker = SentenceWindowChunker::new(config.max_tokens, config.overlap_tokens);
        let retriever = Retriever::new(store.clone(), config.retrieval_k);
        let generator = Generator::new(completion_provider, config.retry.clone());

        Ok(RagPipeline {
            config,
            embedding_provider,
            store,
            chunker,
            retriever,
            reranker,
            generator,
        })
    }
}
