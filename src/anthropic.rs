//! Anthropic completion provider over the messages REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::llm::CompletionProvider;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

const PROVIDER: &str = "Anthropic";

fn missing_key() -> RagError {
    RagError::NotConfigured("ANTHROPIC_API_KEY environment variable not set".to_string())
}

fn api_error(status: StatusCode, detail: String) -> RagError {
    let message = format!("API returned {status}: {detail}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RagError::transient(PROVIDER, message)
    } else {
        RagError::provider(PROVIDER, message)
    }
}

/// A [`CompletionProvider`] backed by the Anthropic messages API.
///
/// The response's text blocks are concatenated into a single completion.
pub struct AnthropicCompletions {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicCompletions {
    /// Create a new provider with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotConfigured`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(missing_key());
        }
        Ok(Self { client: reqwest::Client::new(), api_key, model: DEFAULT_MODEL.to_string() })
    }

    /// Create a new provider using the `ANTHROPIC_API_KEY` environment
    /// variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| missing_key())?;
        Self::new(api_key)
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl CompletionProvider for AnthropicCompletions {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, max_tokens, "message completion");

        let request_body = MessageRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "message request failed");
                RagError::transient(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "messages API error");
            return Err(api_error(status, detail));
        }

        let message_response: MessageResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse message response");
            RagError::provider(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
