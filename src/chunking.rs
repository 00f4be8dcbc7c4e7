//! Sentence-window chunking with token overlap.
//!
//! [`SentenceWindowChunker`] splits text into sentences at punctuation
//! boundaries, then slides a token-bounded window over the sentence stream.
//! Consecutive chunks share up to `overlap_tokens` whole sentences of
//! trailing context; a sentence is never split internally.

use std::collections::{HashMap, VecDeque};

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Split text into sentences at `.`, `!`, or `?` followed by whitespace.
///
/// Carriage returns are treated as spaces. Sentences are trimmed and empty
/// segments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.replace('\r', " ");
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|next| next.is_whitespace()) {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }

    sentences
}

/// Splits text into overlapping, token-bounded chunks of whole sentences.
///
/// Tokens are whitespace-separated words. A single sentence longer than
/// `max_tokens` is emitted whole as an oversized chunk rather than split.
#[derive(Debug, Clone)]
pub struct SentenceWindowChunker {
    max_tokens: usize,
    overlap_tokens: usize,
}

impl SentenceWindowChunker {
    /// Create a new chunker. Callers validate `overlap_tokens < max_tokens`
    /// at configuration time.
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Self {
        Self { max_tokens, overlap_tokens }
    }

    /// Split `text` into chunks for `doc_id`, with `chunk_id` assigned
    /// sequentially from 0.
    ///
    /// If the window algorithm produces nothing for a non-empty input
    /// (pathologically short text), the whole trimmed text becomes chunk 0.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if `text` is empty or whitespace-only.
    pub fn chunk(&self, doc_id: &str, text: &str) -> Result<Vec<Chunk>> {
        if text.trim().is_empty() {
            return Err(RagError::Validation(format!(
                "cannot chunk empty or whitespace-only text for document '{doc_id}'"
            )));
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut window_tokens = 0;

        for sentence in split_sentences(text) {
            let tokens = sentence.split_whitespace().count();
            window_tokens += tokens;
            window.push_back((sentence, tokens));

            // Evict leading sentences once over budget, but keep at least one
            // so an oversized sentence still becomes a chunk.
            while window_tokens > self.max_tokens && window.len() > 1 {
                if let Some((_, dropped)) = window.pop_front() {
                    window_tokens -= dropped;
                }
            }

            if window_tokens >= self.max_tokens.saturating_sub(self.overlap_tokens) {
                chunks.push(self.emit(doc_id, chunks.len() as u32, &window));

                // Seed the next window with as many whole trailing sentences
                // as fit within the overlap budget. A sentence that would
                // exceed the budget is not carried; sentences are never split.
                let mut kept: Vec<(String, usize)> = Vec::new();
                let mut kept_tokens = 0;
                for (sentence, tokens) in window.iter().rev() {
                    if kept_tokens + tokens > self.overlap_tokens {
                        break;
                    }
                    kept.push((sentence.clone(), *tokens));
                    kept_tokens += tokens;
                }
                kept.reverse();
                window_tokens = kept_tokens;
                window = kept.into();
            }
        }

        if !window.is_empty() {
            chunks.push(self.emit(doc_id, chunks.len() as u32, &window));
        }

        if chunks.is_empty() {
            chunks.push(Chunk {
                doc_id: doc_id.to_string(),
                chunk_id: 0,
                content: text.trim().to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
            });
        }

        Ok(chunks)
    }

    fn emit(&self, doc_id: &str, chunk_id: u32, window: &VecDeque<(String, usize)>) -> Chunk {
        let content =
            window.iter().map(|(sentence, _)| sentence.as_str()).collect::<Vec<_>>().join(" ");
        Chunk {
            doc_id: doc_id.to_string(),
            chunk_id,
            content,
            embedding: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    #[test]
    fn splits_sentences_at_terminators() {
        let sentences = split_sentences("One fish. Two fish! Red fish? Blue fish");
        assert_eq!(sentences, vec!["One fish.", "Two fish!", "Red fish?", "Blue fish"]);
    }

    #[test]
    fn carriage_returns_become_spaces() {
        let sentences = split_sentences("First line.\r\nSecond line.");
        assert_eq!(sentences, vec!["First line.", "Second line."]);
    }

    #[test]
    fn terminator_mid_word_does_not_split() {
        let sentences = split_sentences("See e.g. the appendix. Done.");
        // "e.g." splits at "g. " as the original boundary rule dictates.
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn empty_text_is_rejected() {
        let chunker = SentenceWindowChunker::new(50, 10);
        assert!(matches!(chunker.chunk("doc", ""), Err(RagError::Validation(_))));
        assert!(matches!(chunker.chunk("doc", "   \n\t "), Err(RagError::Validation(_))));
    }

    #[test]
    fn short_text_falls_back_to_single_chunk() {
        let chunker = SentenceWindowChunker::new(200, 40);
        let chunks = chunker.chunk("doc", "Just a short note.").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].content, "Just a short note.");
    }

    #[test]
    fn chunk_ids_are_sequential_from_zero() {
        let text = (0..40)
            .map(|i| format!("Sentence number {i} has exactly six tokens."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunker = SentenceWindowChunker::new(30, 7);
        let chunks = chunker.chunk("doc", &text).unwrap();
        assert!(chunks.len() > 1);
        for (idx, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, idx as u32);
            assert_eq!(chunk.doc_id, "doc");
        }
    }

    #[test]
    fn chunks_respect_token_budget_and_overlap() {
        let text = (0..60)
            .map(|i| format!("Token token token token sentence {i}."))
            .collect::<Vec<_>>()
            .join(" ");
        let max_tokens = 30;
        let overlap = 12;
        let chunker = SentenceWindowChunker::new(max_tokens, overlap);
        let chunks = chunker.chunk("doc", &text).unwrap();
        assert!(chunks.len() > 2);

        for chunk in &chunks {
            assert!(token_count(&chunk.content) <= max_tokens);
        }

        // Consecutive chunks share their seed sentences: the head of each
        // following chunk appears at the tail of its predecessor, and the
        // shared region never exceeds the overlap budget.
        for pair in chunks.windows(2) {
            let shared: Vec<String> = split_sentences(&pair[1].content)
                .into_iter()
                .take_while(|sentence| pair[0].content.contains(sentence.as_str()))
                .collect();
            assert!(
                !shared.is_empty(),
                "chunk {} does not carry overlap from chunk {}",
                pair[1].chunk_id,
                pair[0].chunk_id
            );
            let shared_tokens: usize = shared.iter().map(|s| token_count(s)).sum();
            assert!(shared_tokens <= overlap, "overlap of {shared_tokens} tokens exceeds budget");
        }
    }

    #[test]
    fn no_sentence_is_lost_between_chunks() {
        let text = (0..50)
            .map(|i| format!("Unique marker sentence number {i} ends here."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunker = SentenceWindowChunker::new(25, 8);
        let chunks = chunker.chunk("doc", &text).unwrap();
        let combined = chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(" ");
        for i in 0..50 {
            let marker = format!("number {i} ends here.");
            assert!(combined.contains(&marker), "sentence {i} missing from chunk output");
        }
    }

    #[test]
    fn oversized_sentence_is_emitted_whole() {
        let long_sentence =
            (0..80).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ") + ".";
        let text = format!("A tiny lead-in. {long_sentence} A tiny follow-up.");
        let chunker = SentenceWindowChunker::new(20, 5);
        let chunks = chunker.chunk("doc", &text).unwrap();
        assert!(
            chunks.iter().any(|c| c.content.contains("word0") && c.content.contains("word79")),
            "oversized sentence was split or dropped"
        );
    }
}
