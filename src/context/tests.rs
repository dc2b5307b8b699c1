use super::*;
use crate::index::RetrievedChunk;

fn retrieved(rank: usize, source: &str, content: &str) -> RetrievedChunk {
    RetrievedChunk {
        rank,
        source: source.to_string(),
        content: content.to_string(),
        score: 1.0,
    }
}

#[test]
fn empty_input_yields_empty_outputs() {
    let (context, citations) = format_context(&[]);

    assert!(context.is_empty());
    assert!(citations.is_empty());
}

#[test]
fn single_chunk_labels_match() {
    let chunks = vec![retrieved(1, "docs/sky.md", "The sky is blue.")];

    let (context, citations) = format_context(&chunks);

    assert_eq!(context, "Source [1] (docs/sky.md)\nThe sky is blue.");
    assert_eq!(citations, vec!["[1] docs/sky.md".to_string()]);
}

#[test]
fn citation_count_and_order_match_context() {
    let chunks = vec![
        retrieved(1, "a.md", "first"),
        retrieved(2, "b.txt", "second"),
        retrieved(3, "c.md", "third"),
    ];

    let (context, citations) = format_context(&chunks);

    assert_eq!(citations.len(), chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(citations[i], format!("[{}] {}", i + 1, chunk.source));
        assert!(context.contains(&format!("Source [{}] ({})", i + 1, chunk.source)));
    }

    // Chunks are joined by a blank line, in rank order.
    let first = context.find("Source [1]").expect("first label present");
    let second = context.find("Source [2]").expect("second label present");
    let third = context.find("Source [3]").expect("third label present");
    assert!(first < second && second < third);
    assert_eq!(context.matches("\n\n").count(), 2);
}

#[test]
fn sources_block_renders_one_citation_per_line() {
    let citations = vec!["[1] a.md".to_string(), "[2] b.md".to_string()];

    assert_eq!(sources_block(&citations), "Sources:\n[1] a.md\n[2] b.md");
}
