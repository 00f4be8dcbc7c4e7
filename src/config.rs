//! Configuration for the retrieval and generation pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::llm::GenerationBackend;
use crate::retry::RetryPolicy;

/// Configuration parameters consumed at the pipeline boundary.
///
/// Loading values from the process environment or a config file is the
/// caller's concern; validation happens in [`PipelineConfigBuilder::build`],
/// before any ingestion or query runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum chunk size in whitespace tokens.
    pub max_tokens: usize,
    /// Number of overlapping tokens carried between consecutive chunks.
    pub overlap_tokens: usize,
    /// Default number of candidates returned by similarity search.
    pub retrieval_k: usize,
    /// Number of candidates a reranker is asked to score.
    pub rerank_top_k: usize,
    /// Default number of sources cited when drafting a paper section.
    pub num_sources: usize,
    /// Whether the rerank stage runs at all.
    pub rerank_enabled: bool,
    /// Which generation backend answers questions and drafts sections.
    pub generation_backend: GenerationBackend,
    /// Backoff applied to every external provider call.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tokens: 220,
            overlap_tokens: 40,
            retrieval_k: 8,
            rerank_top_k: 5,
            num_sources: 8,
            rerank_enabled: true,
            generation_backend: GenerationBackend::Anthropic,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the maximum chunk size in tokens.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the token overlap between consecutive chunks.
    pub fn overlap_tokens(mut self, overlap_tokens: usize) -> Self {
        self.config.overlap_tokens = overlap_tokens;
        self
    }

    /// Set the default similarity-search width.
    pub fn retrieval_k(mut self, k: usize) -> Self {
        self.config.retrieval_k = k;
        self
    }

    /// Set the number of candidates passed to the reranker.
    pub fn rerank_top_k(mut self, k: usize) -> Self {
        self.config.rerank_top_k = k;
        self
    }

    /// Set the default number of cited sources for section drafts.
    pub fn num_sources(mut self, num_sources: usize) -> Self {
        self.config.num_sources = num_sources;
        self
    }

    /// Enable or disable the rerank stage.
    pub fn rerank_enabled(mut self, enabled: bool) -> Self {
        self.config.rerank_enabled = enabled;
        self
    }

    /// Select the generation backend.
    pub fn generation_backend(mut self, backend: GenerationBackend) -> Self {
        self.config.generation_backend = backend;
        self
    }

    /// Set the retry policy for external provider calls.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `max_tokens == 0`
    /// - `overlap_tokens >= max_tokens`
    /// - `retrieval_k == 0`
    /// - `rerank_top_k == 0`
    /// - `num_sources == 0`
    pub fn build(self) -> Result<PipelineConfig> {
        let config = self.config;
        if config.max_tokens == 0 {
            return Err(RagError::Config("max_tokens must be greater than zero".to_string()));
        }
        if config.overlap_tokens >= config.max_tokens {
            return Err(RagError::Config(format!(
                "overlap_tokens ({}) must be less than max_tokens ({})",
                config.overlap_tokens, config.max_tokens
            )));
        }
        if config.retrieval_k == 0 {
            return Err(RagError::Config("retrieval_k must be greater than zero".to_string()));
        }
        if config.rerank_top_k == 0 {
            return Err(RagError::Config("rerank_top_k must be greater than zero".to_string()));
        }
        if config.num_sources == 0 {
            return Err(RagError::Config("num_sources must be greater than zero".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn overlap_must_be_smaller_than_max_tokens() {
        let err = PipelineConfig::builder().max_tokens(100).overlap_tokens(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));

        let err = PipelineConfig::builder().max_tokens(100).overlap_tokens(150).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));

        assert!(PipelineConfig::builder().max_tokens(100).overlap_tokens(99).build().is_ok());
    }

    #[test]
    fn zero_widths_are_rejected() {
        assert!(PipelineConfig::builder().retrieval_k(0).build().is_err());
        assert!(PipelineConfig::builder().rerank_top_k(0).build().is_err());
        assert!(PipelineConfig::builder().num_sources(0).build().is_err());
        assert!(PipelineConfig::builder().max_tokens(0).build().is_err());
    }
}
