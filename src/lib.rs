use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocsChatError>;

#[derive(Error, Debug)]
pub enum DocsChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Documents(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod context;
pub mod documents;
pub mod embeddings;
pub mod history;
pub mod index;
pub mod pipeline;
