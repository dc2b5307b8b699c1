
use anyhow::{Context, Result};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::DocsChatError;

/// Extensions collected from the document source directory.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "txt"];

/// How many document reads may be in flight at once during loading.
const LOAD_CONCURRENCY: usize = 8;

/// A raw source document, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path of the file this document was loaded from
    pub source: String,
    /// Full raw text
    pub content: String,
    /// Arbitrary metadata, always containing at least `source`
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    #[inline]
    pub fn new(source: String, content: String) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), source.clone());
        Self {
            source,
            content,
            metadata,
        }
    }
}

/// Recursively collect `.md` and `.txt` files under `docs_dir`, sorted by
/// path for deterministic ordering.
#[inline]
pub fn collect_document_paths(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !docs_dir.is_dir() {
        return Err(DocsChatError::Documents(format!(
            "Docs folder not found: {}",
            docs_dir.display()
        ))
        .into());
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(docs_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    DOCUMENT_EXTENSIONS
                        .iter()
                        .any(|wanted| ext.eq_ignore_ascii_case(wanted))
                })
        })
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();

    debug!(
        "Found {} document files under {}",
        paths.len(),
        docs_dir.display()
    );

    Ok(paths)
}

/// Load all documents from `docs_dir`. File reads fan out concurrently;
/// each load is independent and the result order does not matter to the
/// chunker or index build. Fails if no matching files are found.
#[inline]
pub async fn load_documents(docs_dir: &Path) -> Result<Vec<Document>> {
    let paths = collect_document_paths(docs_dir)?;

    if paths.is_empty() {
        return Err(DocsChatError::Documents(format!(
            "No .md or .txt documents found in {}. Add documents and try again.",
            docs_dir.display()
        ))
        .into());
    }

    let documents: Vec<Document> = futures::stream::iter(paths)
        .map(|path| async move {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read document: {}", path.display()))?;
            Ok::<Document, anyhow::Error>(Document::new(path.display().to_string(), content))
        })
        .buffer_unordered(LOAD_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Loaded {} documents from {}",
        documents.len(),
        docs_dir.display()
    );

    Ok(documents)
}
