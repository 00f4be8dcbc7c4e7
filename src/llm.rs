//! Answer and section generation via interchangeable completion backends.
//!
//! The [`CompletionProvider`] trait is the single seam between the pipeline
//! and a text-generation API. Two backends implement it
//! ([`AnthropicCompletions`](crate::anthropic::AnthropicCompletions) and
//! [`OpenAiCompletions`](crate::openai::OpenAiCompletions)); which one runs is
//! a configuration value resolved by [`provider_from_backend`], not a branch
//! in caller code.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::RetrievedChunk;
use crate::error::Result;
use crate::retry::{RetryPolicy, with_retry};
use crate::sections::SectionKind;

/// A text-generation backend: one prompt in, one completion out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;

    /// The backend name, used in logs and error messages.
    fn name(&self) -> &str;
}

/// Which generation backend the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// Anthropic messages API.
    Anthropic,
    /// OpenAI chat completions API.
    OpenAi,
}

/// Construct the completion provider selected by configuration, reading the
/// backend's API key from the process environment.
///
/// # Errors
///
/// Returns [`RagError::NotConfigured`](crate::error::RagError::NotConfigured)
/// if the selected backend's credential is missing.
pub fn provider_from_backend(backend: GenerationBackend) -> Result<Arc<dyn CompletionProvider>> {
    match backend {
        GenerationBackend::Anthropic => {
            Ok(Arc::new(crate::anthropic::AnthropicCompletions::from_env()?))
        }
        GenerationBackend::OpenAi => Ok(Arc::new(crate::openai::OpenAiCompletions::from_env()?)),
    }
}

const ANSWER_MAX_TOKENS: u32 = 600;
const ANSWER_TEMPERATURE: f32 = 0.1;

// Section drafts are much longer than answers, and a slightly higher
// temperature keeps the prose from reading stilted.
const SECTION_MAX_TOKENS: u32 = 4000;
const SECTION_TEMPERATURE: f32 = 0.3;

/// Builds the final prompt and invokes the completion provider, with every
/// call wrapped in the retry policy.
pub struct Generator {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryPolicy,
}

impl Generator {
    /// Create a generator over `provider` with the given retry policy.
    pub fn new(provider: Arc<dyn CompletionProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Generate an answer to `question` grounded in `context`.
    pub async fn answer(&self, question: &str, context: &[RetrievedChunk]) -> Result<String> {
        let prompt = build_answer_prompt(question, context);
        debug!(
            provider = self.provider.name(),
            context_chunks = context.len(),
            "generating answer"
        );
        with_retry(&self.retry, "generate answer", || {
            self.provider.complete(&prompt, ANSWER_MAX_TOKENS, ANSWER_TEMPERATURE)
        })
        .await
    }

    /// Generate a paper section of the given kind about `topic`, grounded in
    /// the pre-rendered, citation-tagged `context`.
    pub async fn section(
        &self,
        kind: SectionKind,
        topic: &str,
        context: &str,
    ) -> Result<String> {
        let prompt = build_section_prompt(kind, topic, context);
        debug!(provider = self.provider.name(), section = %kind, "generating section");
        with_retry(&self.retry, "generate section", || {
            self.provider.complete(&prompt, SECTION_MAX_TOKENS, SECTION_TEMPERATURE)
        })
        .await
    }
}

/// Build the question-answering prompt: fixed preamble, one tagged block per
/// context chunk, question last.
fn build_answer_prompt(question: &str, context: &[RetrievedChunk]) -> String {
    let mut parts = vec![
        "You are a helpful assistant. Use only the provided context to answer,".to_string(),
        "and cite your sources in the form [doc_id#chunk_id].".to_string(),
        "If the context is not sufficient to answer, say so clearly.".to_string(),
        "\nContext:\n".to_string(),
    ];
    for chunk in context {
        parts.push(format!("[{}]\n{}\n", chunk.reference(), chunk.content));
    }
    parts.push(format!("\nQuestion:\n{question}"));
    parts.join("\n")
}

/// Build the section-drafting prompt: scientific-writing preamble, topic,
/// cited literature context, then the section kind's instruction fragment.
fn build_section_prompt(kind: SectionKind, topic: &str, context: &str) -> String {
    format!(
        "You are an academic author. Write a scholarly text in formal academic English.\n\
         \n\
         IMPORTANT:\n\
         - Use only the provided literature context as your basis\n\
         - Cite every source you use in Harvard style (Author, Year)\n\
         - Write objectively, precisely, and scientifically\n\
         - Avoid personal opinions and unscientific phrasing\n\
         - Use technical terminology appropriately\n\
         - Structure the text logically and coherently\n\
         \n\
         Topic: {topic}\n\
         \n\
         Literature context:\n\
         {context}\n\
         \n\
         {instruction}",
        instruction = kind.profile().instruction,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn chunk(doc_id: &str, chunk_id: u32, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            doc_id: doc_id.to_string(),
            chunk_id,
            content: content.to_string(),
            score: 0.9,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn answer_prompt_tags_context_and_ends_with_question() {
        let context = vec![chunk("doc1", 0, "First passage."), chunk("doc2", 3, "Second passage.")];
        let prompt = build_answer_prompt("What is the passage about?", &context);

        assert!(prompt.contains("[doc1#0]\nFirst passage."));
        assert!(prompt.contains("[doc2#3]\nSecond passage."));
        assert!(prompt.ends_with("Question:\nWhat is the passage about?"));
        assert!(prompt.contains("[doc_id#chunk_id]"));
    }

    #[test]
    fn section_prompt_embeds_topic_context_and_kind_instruction() {
        let prompt = build_section_prompt(
            SectionKind::Methodology,
            "machine translation quality",
            "[Source 1: (Vu, 2020)]\nSome passage.",
        );
        assert!(prompt.contains("Topic: machine translation quality"));
        assert!(prompt.contains("[Source 1: (Vu, 2020)]"));
        assert!(prompt.contains(SectionKind::Methodology.profile().instruction));
        assert!(prompt.contains("Harvard style"));
    }
}
