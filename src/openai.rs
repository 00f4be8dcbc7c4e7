//! OpenAI providers: embeddings and chat completions over the REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::CompletionProvider;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-large";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const PROVIDER: &str = "OpenAI";

/// Embedding dimensionality implied by an OpenAI embedding model name.
fn model_dimensions(model: &str) -> usize {
    let model = model.to_lowercase();
    if model.contains("large") {
        3072
    } else if model.contains("small") || model.contains("mini") {
        512
    } else {
        1536
    }
}

fn missing_key() -> RagError {
    RagError::NotConfigured("OPENAI_API_KEY environment variable not set".to_string())
}

/// Classify an HTTP failure status: rate limits and server errors are
/// transient, everything else is a generic provider error.
fn api_error(status: StatusCode, detail: String) -> RagError {
    let message = format!("API returned {status}: {detail}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RagError::transient(PROVIDER, message)
    } else {
        RagError::provider(PROVIDER, message)
    }
}

/// Transport-level failures (connect errors, timeouts) are transient.
fn transport_error(e: reqwest::Error) -> RagError {
    RagError::transient(PROVIDER, format!("request failed: {e}"))
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract a human-readable error message from a failed response body.
async fn error_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// Batch results are re-sorted by the response `index` field, so output
/// order always matches input order.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddings {
    /// Create a new provider with the given API key and the default model
    /// (`text-embedding-3-large`).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotConfigured`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(missing_key());
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBED_MODEL.to_string(),
            dimensions: model_dimensions(DEFAULT_EMBED_MODEL),
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| missing_key())?;
        Self::new(api_key)
    }

    /// Set the embedding model. The reported dimensionality follows the
    /// model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = model_dimensions(&self.model);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::provider(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                transport_error(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(provider = PROVIDER, %status, "embedding API error");
            return Err(api_error(status, detail));
        }

        let mut embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            RagError::provider(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        // The API may return items out of order; restore input order.
        embedding_response.data.sort_by_key(|d| d.index);
        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`CompletionProvider`] backed by the OpenAI chat completions API.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiCompletions {
    /// Create a new provider with the given API key and the default model
    /// (`gpt-4o-mini`).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotConfigured`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(missing_key());
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| missing_key())?;
        Self::new(api_key)
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, max_tokens, "chat completion");

        let request_body = ChatRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![
                ChatMessage { role: "system", content: "Follow the user's instructions exactly." },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "chat request failed");
                transport_error(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(provider = PROVIDER, %status, "chat API error");
            return Err(api_error(status, detail));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse chat response");
            RagError::provider(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
