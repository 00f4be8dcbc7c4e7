//! Error types for the `scholar-rag` crate.

use thiserror::Error;

/// Errors that can occur in the retrieval and generation pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid input data, such as empty or whitespace-only document text.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid or inconsistent configuration, rejected before any work starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A credential required by a selected provider is missing.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// A transient provider failure: network error, timeout, or rate limit.
    #[error("Transient provider error ({provider}): {message}")]
    Transient {
        /// The provider that produced the failure.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A structured provider response that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Any other provider failure.
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// The provider that produced the failure.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    Store {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether a retry policy may re-attempt the failed operation.
    ///
    /// Transient failures are retryable. Generic provider failures are
    /// currently retried as well, even though some of their causes (malformed
    /// request, revoked key) are not transient. Everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::Transient { .. } | RagError::Provider { .. })
    }

    /// Shorthand for a [`RagError::Transient`].
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::Transient { provider: provider.into(), message: message.into() }
    }

    /// Shorthand for a [`RagError::Provider`].
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::Provider { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
