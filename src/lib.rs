//! Retrieval-augmented question answering and scientific writing.
//!
//! `scholar-rag` turns ingested documents into a searchable chunk index and
//! answers questions or drafts Harvard-cited paper sections from that index.
//! The pipeline composes:
//!
//! - [`SentenceWindowChunker`] — token-windowed, sentence-preserving chunking
//! - [`EmbeddingProvider`] — text → vector (OpenAI embeddings built in)
//! - [`VectorStore`] — `(doc_id, chunk_id)`-keyed upsert and similarity
//!   search ([`InMemoryVectorStore`] built in, pgvector behind a feature)
//! - [`Reranker`] — optional second-pass LLM reordering of candidates
//! - [`CompletionProvider`] — text generation (Anthropic and OpenAI backends)
//! - [`Citation`] — Harvard in-text citations and reference lists
//!
//! Every external provider call is wrapped in an explicit [`RetryPolicy`]
//! with exponential backoff. See [`RagPipeline`] for the two request flows.

pub mod anthropic;
pub mod chunking;
pub mod citation;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;
pub mod retry;
pub mod sections;
pub mod vectorstore;

#[cfg(feature = "pgvector")]
pub mod pgvector;

pub use anthropic::AnthropicCompletions;
pub use chunking::{SentenceWindowChunker, split_sentences};
pub use citation::{Citation, build_reference_list};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{Chunk, RetrievedChunk, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use llm::{CompletionProvider, GenerationBackend, Generator, provider_from_backend};
pub use openai::{OpenAiCompletions, OpenAiEmbeddings};
pub use pipeline::{Answer, RagPipeline, RagPipelineBuilder, SectionDraft};
pub use rerank::{LlmReranker, Reranker};
pub use retrieval::Retriever;
pub use retry::{RetryPolicy, with_retry};
pub use sections::{SectionKind, SectionProfile};
pub use vectorstore::VectorStore;

#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
