// Embedding capability
// The vector index consumes this as an opaque capability so tests can
// substitute a deterministic implementation.

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaClient;

/// Computes fixed-length embedding vectors for text.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
