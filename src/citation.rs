//! Harvard-style citations and reference lists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::document::RetrievedChunk;

/// A Harvard-style citation for one retrieved source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// Identifier of the cited document.
    pub doc_id: String,
    /// Index of the cited chunk within the document.
    pub chunk_id: u32,
    /// Author string from the chunk metadata, when present.
    pub authors: Option<String>,
    /// Publication year from the chunk metadata, when present.
    pub year: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

impl Citation {
    /// Build a citation for a retrieved chunk from its `authors` and `year`
    /// metadata. Empty metadata values count as absent.
    pub fn for_chunk(chunk: &RetrievedChunk) -> Self {
        Citation {
            doc_id: chunk.doc_id.clone(),
            chunk_id: chunk.chunk_id,
            authors: non_empty(chunk.metadata.get("authors")),
            year: non_empty(chunk.metadata.get("year")),
        }
    }

    /// The in-text form: `(<first author surname>, <year>)`, falling back to
    /// `(<doc_id>)` when authors or year are absent.
    ///
    /// The surname is the authors substring before the first comma or an
    /// ` et al.` marker.
    pub fn in_text(&self) -> String {
        match (&self.authors, &self.year) {
            (Some(authors), Some(year)) => {
                let first = authors.split(',').next().unwrap_or(authors);
                let surname = first.split(" et al.").next().unwrap_or(first).trim();
                format!("({surname}, {year})")
            }
            _ => format!("({})", self.doc_id),
        }
    }

    /// The full reference form: `<authors> (<year>). <doc_id>`, falling back
    /// to the bare `doc_id` when authors or year are absent.
    pub fn reference(&self) -> String {
        match (&self.authors, &self.year) {
            (Some(authors), Some(year)) => format!("{authors} ({year}). {}", self.doc_id),
            _ => self.doc_id.clone(),
        }
    }
}

/// Render a deduplicated, alphabetized Harvard reference list.
///
/// Citations are deduplicated by their `(authors, year)` pair, keeping the
/// first occurrence. Anonymous citations (no authors and no year) therefore
/// collapse into a single entry. Returns an empty string when `citations` is
/// empty. The function is pure: repeated calls on the same input produce
/// byte-identical output.
pub fn build_reference_list(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for citation in citations {
        let key = format!(
            "{}_{}",
            citation.authors.as_deref().unwrap_or(""),
            citation.year.as_deref().unwrap_or("")
        );
        if seen.insert(key) {
            references.push(citation.reference());
        }
    }

    references.sort();
    format!("\n\n**References:**\n\n{}", references.join("\n\n"))
}
