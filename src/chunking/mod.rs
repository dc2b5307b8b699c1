#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::documents::Document;

/// A bounded piece of a source document, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk text
    pub content: String,
    /// Metadata inherited unchanged from the parent document
    pub metadata: BTreeMap<String, String>,
    /// Position of this chunk within the document
    pub chunk_index: usize,
}

impl Chunk {
    /// The source path recorded in the chunk's metadata.
    #[inline]
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .map_or("unknown_source", String::as_str)
    }
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Characters shared between the tail of one chunk and the head of the next
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 900,
            overlap: 150,
        }
    }
}

/// Split a document into overlapping chunks, preferring paragraph, then
/// sentence, then word boundaries before falling back to a hard cut.
/// Deterministic for a given (text, config) pair. A document shorter than
/// the maximum chunk size yields exactly one chunk equal to the whole text.
#[inline]
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let pieces = split_text(&document.content, config);

    let chunks: Vec<Chunk> = pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| Chunk {
            content,
            metadata: document.metadata.clone(),
            chunk_index,
        })
        .collect();

    debug!(
        "Chunked document '{}' into {} chunks",
        document.source,
        chunks.len()
    );

    chunks
}

/// Split raw text into pieces of at most `max_chunk_size` characters with
/// `overlap` characters carried over between consecutive pieces.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let max = config.max_chunk_size;

    if chars.len() <= max {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    while chars.len() - start > max {
        let window = &chars[start..start + max];
        let cut = find_cut_point(window, config.overlap);

        pieces.push(window[..cut].iter().collect::<String>());

        // Step back by the overlap so boundary context is not lost, while
        // always making forward progress.
        start = (start + cut.saturating_sub(config.overlap)).max(start + 1);
    }

    pieces.push(chars[start..].iter().collect::<String>());
    pieces
}

/// Find the exclusive end of the next piece within the window, preferring
/// a paragraph break, then a sentence end, then whitespace. A candidate is
/// only usable if it leaves room to step back by `overlap` and still
/// advance; otherwise the next preference is tried, ending with a hard cut
/// at the full window.
fn find_cut_point(window: &[char], overlap: usize) -> usize {
    let min_cut = overlap + 1;

    // Paragraph boundary: cut after "\n\n"
    for i in (min_cut..window.len()).rev() {
        if window[i - 1] == '\n' && i >= 2 && window[i - 2] == '\n' {
            return i;
        }
    }

    // Sentence boundary: terminator followed by whitespace
    for i in (min_cut..window.len()).rev() {
        if matches!(window[i - 1], '.' | '!' | '?') && window.get(i).is_some_and(|c| c.is_whitespace())
        {
            return i;
        }
    }

    // Word boundary: cut after whitespace
    for i in (min_cut..window.len()).rev() {
        if window[i - 1].is_whitespace() {
            return i;
        }
    }

    // No usable boundary, hard cut at the window end
    window.len()
}
