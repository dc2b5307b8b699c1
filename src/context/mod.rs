#[cfg(test)]
mod tests;

use crate::index::RetrievedChunk;

/// Build a numbered context block and a parallel citation list from
/// retrieved chunks. The citation list always matches the order and count
/// of chunks included in the context string.
#[inline]
pub fn format_context(retrieved: &[RetrievedChunk]) -> (String, Vec<String>) {
    let mut parts = Vec::with_capacity(retrieved.len());
    let mut citations = Vec::with_capacity(retrieved.len());

    for chunk in retrieved {
        citations.push(format!("[{}] {}", chunk.rank, chunk.source));
        parts.push(format!(
            "Source [{}] ({})\n{}",
            chunk.rank, chunk.source, chunk.content
        ));
    }

    (parts.join("\n\n"), citations)
}

/// Render the trailing block appended to displayed answers.
#[inline]
pub fn sources_block(citations: &[String]) -> String {
    format!("Sources:\n{}", citations.join("\n"))
}
