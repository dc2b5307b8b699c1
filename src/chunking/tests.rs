use super::*;
use crate::documents::Document;

fn doc(text: &str) -> Document {
    Document::new("docs/guide.md".to_string(), text.to_string())
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

#[test]
fn short_document_yields_single_whole_chunk() {
    let config = ChunkingConfig::default();
    let document = doc("A short note that fits in one chunk.");

    let chunks = chunk_document(&document, &config);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, document.content);
    assert_eq!(chunks[0].chunk_index, 0);
}

#[test]
fn document_exactly_at_limit_is_one_chunk() {
    let config = ChunkingConfig {
        max_chunk_size: 50,
        overlap: 10,
    };
    let text = "a".repeat(50);

    let pieces = split_text(&text, &config);

    assert_eq!(pieces, vec![text]);
}

#[test]
fn no_chunk_exceeds_max_size() {
    let config = ChunkingConfig {
        max_chunk_size: 100,
        overlap: 20,
    };
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);

    let pieces = split_text(&text, &config);

    assert!(pieces.len() > 1);
    for piece in &pieces {
        assert!(
            char_count(piece) <= 100,
            "chunk of {} chars exceeds the maximum size",
            char_count(piece)
        );
    }
}

#[test]
fn consecutive_chunks_share_overlap() {
    let config = ChunkingConfig {
        max_chunk_size: 100,
        overlap: 20,
    };
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);

    let pieces = split_text(&text, &config);

    for pair in pieces.windows(2) {
        let prev: Vec<char> = pair[0].chars().collect();
        let suffix: String = prev[prev.len() - config.overlap..].iter().collect();
        assert!(
            pair[1].starts_with(&suffix),
            "next chunk does not begin with the previous chunk's tail"
        );
    }
}

#[test]
fn splitting_is_deterministic() {
    let config = ChunkingConfig::default();
    let text = "Paragraph one.\n\nParagraph two is a little longer. ".repeat(60);

    assert_eq!(split_text(&text, &config), split_text(&text, &config));
}

#[test]
fn prefers_paragraph_boundaries() {
    let config = ChunkingConfig {
        max_chunk_size: 60,
        overlap: 10,
    };
    let text = format!("{}\n\n{}", "alpha ".repeat(7).trim(), "beta ".repeat(20));

    let pieces = split_text(&text, &config);

    // The first cut should land on the paragraph break, not mid-word.
    assert!(pieces[0].ends_with('\n'));
}

#[test]
fn hard_cut_when_no_boundary_exists() {
    let config = ChunkingConfig {
        max_chunk_size: 900,
        overlap: 150,
    };
    let text = "x".repeat(2500);

    let pieces = split_text(&text, &config);

    assert_eq!(pieces.len(), 4);
    for piece in &pieces {
        assert!(char_count(piece) <= 900);
    }
}

#[test]
fn chunks_inherit_document_metadata() {
    let config = ChunkingConfig {
        max_chunk_size: 40,
        overlap: 5,
    };
    let mut document = doc(&"words and more words. ".repeat(20));
    document
        .metadata
        .insert("language".to_string(), "en".to_string());

    let chunks = chunk_document(&document, &config);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert_eq!(chunk.metadata, document.metadata);
        assert_eq!(chunk.source(), "docs/guide.md");
    }
}

#[test]
fn chunk_indices_are_sequential() {
    let config = ChunkingConfig {
        max_chunk_size: 40,
        overlap: 5,
    };
    let document = doc(&"some sentence here. ".repeat(30));

    let chunks = chunk_document(&document, &config);

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
    }
}

#[test]
fn source_falls_back_when_metadata_missing() {
    let chunk = Chunk {
        content: "text".to_string(),
        metadata: std::collections::BTreeMap::new(),
        chunk_index: 0,
    };

    assert_eq!(chunk.source(), "unknown_source");
}

#[test]
fn multibyte_text_respects_char_limit() {
    let config = ChunkingConfig {
        max_chunk_size: 50,
        overlap: 10,
    };
    let text = "héllo wörld ünïcode ".repeat(20);

    let pieces = split_text(&text, &config);

    for piece in &pieces {
        assert!(char_count(piece) <= 50);
    }
}
