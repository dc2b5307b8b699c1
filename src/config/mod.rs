
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::chunking::ChunkingConfig;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_CHAT_MODEL: &str = "kimi-k2.5:cloud";
pub const DEFAULT_EMBED_MODEL: &str = "embeddinggemma:latest";
pub const DEFAULT_DOCS_DIR: &str = "./docs";
pub const DEFAULT_INDEX_DIR: &str = "./.vector_index";
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub provider: ChatProvider,
    pub openai: Option<OpenAiConfig>,
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub max_history_turns: usize,
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub batch_size: u32,
}

/// Which backend answers chat completions. Selected once at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    Ollama,
    OpenAi,
}

/// Settings for the generic bearer-token HTTP completion backend.
/// Both fields are mandatory when the `openai` provider is selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            batch_size: 16,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid chat provider: {0} (must be 'ollama' or 'openai')")]
    InvalidProvider(String),
    #[error("OPENAI_BASE_URL is required when CHAT_PROVIDER=openai")]
    MissingOpenAiBaseUrl,
    #[error("OPENAI_API_KEY is required when CHAT_PROVIDER=openai")]
    MissingOpenAiApiKey,
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid top-k: {0} (must be at least 1)")]
    InvalidTopK(usize),
    #[error("Invalid max chunk size: {0} (must be at least 1)")]
    InvalidMaxChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than max chunk size ({1})")]
    OverlapTooLarge(usize, usize),
}

impl Config {
    /// Build the configuration from the process environment, falling back
    /// to documented defaults for anything unset.
    #[inline]
    pub fn from_env() -> Result<Self> {
        let ollama = OllamaConfig {
            base_url: env_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL),
            chat_model: env_or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            embed_model: env_or("EMBED_MODEL", DEFAULT_EMBED_MODEL),
            batch_size: OllamaConfig::default().batch_size,
        };

        let provider = match env::var("CHAT_PROVIDER") {
            Ok(value) => value.parse::<ChatProvider>()?,
            Err(_) => ChatProvider::Ollama,
        };

        let openai = match (env::var("OPENAI_BASE_URL"), env::var("OPENAI_API_KEY")) {
            (Ok(base_url), Ok(api_key)) => Some(OpenAiConfig { base_url, api_key }),
            (Ok(_), Err(_)) if provider == ChatProvider::OpenAi => {
                return Err(ConfigError::MissingOpenAiApiKey.into());
            }
            (Err(_), Ok(_)) if provider == ChatProvider::OpenAi => {
                return Err(ConfigError::MissingOpenAiBaseUrl.into());
            }
            _ => None,
        };

        let config = Self {
            ollama,
            provider,
            openai,
            docs_dir: PathBuf::from(env_or("DOCS_DIR", DEFAULT_DOCS_DIR)),
            index_dir: PathBuf::from(env_or("INDEX_DIR", DEFAULT_INDEX_DIR)),
            top_k: DEFAULT_TOP_K,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            chunking: ChunkingConfig::default(),
        };

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;

        if self.provider == ChatProvider::OpenAi {
            let openai = self
                .openai
                .as_ref()
                .ok_or(ConfigError::MissingOpenAiBaseUrl)?;
            openai.validate()?;
        }

        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError::InvalidMaxChunkSize(
                self.chunking.max_chunk_size,
            ));
        }

        if self.chunking.overlap >= self.chunking.max_chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.overlap,
                self.chunking.max_chunk_size,
            ));
        }

        Ok(())
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if self.embed_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embed_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))
    }
}

impl OpenAiConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingOpenAiApiKey);
        }

        Ok(())
    }
}

impl std::str::FromStr for ChatProvider {
    type Err = ConfigError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidProvider(other.to_string())),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
