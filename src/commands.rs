use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use tracing::{info, warn};

use crate::chat::completer_from_config;
use crate::chunking::{Chunk, chunk_document};
use crate::config::{ChatProvider, Config};
use crate::documents::load_documents;
use crate::embeddings::{Embedder, OllamaClient};
use crate::history::History;
use crate::index::{IndexState, VectorIndex};
use crate::pipeline::answer_question;

/// Run the interactive question-answering session: probe the backend,
/// make sure the required models are installed, resolve the index state,
/// then accept questions until the exit sentinel.
#[inline]
pub async fn run_chat(config: Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;

    client.probe_reachable()?;

    client
        .ensure_model(&config.ollama.embed_model)
        .context("Embedding model is unavailable")?;
    if config.provider == ChatProvider::Ollama {
        client
            .ensure_model(&config.ollama.chat_model)
            .context("Chat model is unavailable")?;
    }

    let index = open_or_build_index(&config, Box::new(client)).await?;
    let completer = completer_from_config(&config)?;

    let mut history = History::new();

    println!(
        "{}",
        style(format!(
            "Ready. {} chunks indexed at {}.",
            index.count_chunks().await?,
            index.location().display()
        ))
        .dim()
    );

    loop {
        let question: String = match Input::new()
            .with_prompt("\nAsk a question (or type exit)")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // Interrupt or closed stdin ends the session.
            Err(_) => break,
        };

        let question = question.trim().to_string();
        if question.is_empty() || question.eq_ignore_ascii_case("exit") {
            break;
        }

        match answer_question(
            &index,
            &question,
            history.recent(config.max_history_turns),
            completer.as_ref(),
            config.top_k,
        )
        .await
        {
            Ok(answer) => {
                println!("\n{}", answer.display);
                history.append(question, answer.raw);
            }
            Err(e) => {
                warn!("Question failed: {:#}", e);
                println!("\n{}", style(format!("Error: {:#}", e)).red());
            }
        }
    }

    Ok(())
}

/// Delete any persisted index and build a fresh one from the current
/// document set. Never runs implicitly; stale indexes are otherwise
/// reused silently.
#[inline]
pub async fn rebuild_index(config: Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;

    client.probe_reachable()?;
    client
        .ensure_model(&config.ollama.embed_model)
        .context("Embedding model is unavailable")?;

    if let IndexState::Present(location) = IndexState::resolve(&config.index_dir) {
        info!("Removing existing index at {}", location.display());
        std::fs::remove_dir_all(&location)
            .with_context(|| format!("Failed to remove index at {}", location.display()))?;
    }

    let index = build_index(&config, Box::new(client)).await?;

    println!(
        "Rebuilt index: {} chunks at {}",
        index.count_chunks().await?,
        index.location().display()
    );

    Ok(())
}

/// Print the resolved configuration.
#[inline]
pub fn show_config(config: &Config) {
    println!("Ollama base URL:   {}", config.ollama.base_url);
    println!("Chat provider:     {:?}", config.provider);
    println!("Chat model:        {}", config.ollama.chat_model);
    println!("Embedding model:   {}", config.ollama.embed_model);
    if let Some(openai) = &config.openai {
        println!("OpenAI endpoint:   {}", openai.base_url);
        println!("OpenAI API key:    (set)");
    }
    println!("Docs directory:    {}", config.docs_dir.display());
    println!("Index directory:   {}", config.index_dir.display());
    println!("Top-k:             {}", config.top_k);
    println!("History window:    {} turns", config.max_history_turns);
    println!(
        "Chunking:          {} chars, {} overlap",
        config.chunking.max_chunk_size, config.chunking.overlap
    );
}

/// Resolve the index state once: load the persisted index if one exists,
/// otherwise build from the document set. Presence of the index directory
/// is the sole criterion; document changes are never detected.
async fn open_or_build_index(config: &Config, embedder: Box<dyn Embedder>) -> Result<VectorIndex> {
    match IndexState::resolve(&config.index_dir) {
        IndexState::Present(location) => {
            info!(
                "Reusing persisted index at {} (document changes are not detected; run `rebuild` to re-index)",
                location.display()
            );
            Ok(VectorIndex::load(&location, embedder).await?)
        }
        IndexState::Absent => build_index(config, embedder).await,
    }
}

async fn build_index(config: &Config, embedder: Box<dyn Embedder>) -> Result<VectorIndex> {
    let documents = load_documents(&config.docs_dir).await?;

    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| chunk_document(doc, &config.chunking))
        .collect();

    info!(
        "Chunked {} documents into {} chunks",
        documents.len(),
        chunks.len()
    );

    Ok(VectorIndex::build(&config.index_dir, &chunks, embedder).await?)
}
