#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::Embedder;
use crate::config::OllamaConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// How long the startup reachability probe waits before giving up.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client for the Ollama HTTP API: reachability probing, model
/// management, and embedding generation. Requests are single-shot; retry
/// behavior is left to the server side.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    batch_size: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    model: String,
    #[serde(rename = "input")]
    inputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct PullRequest {
    model: String,
}

#[derive(Debug, Deserialize)]
struct PullProgress {
    status: String,
    total: Option<u64>,
    completed: Option<u64>,
    error: Option<String>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to parse Ollama base URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.embed_model.clone(),
            batch_size: config.batch_size,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Probe the Ollama server before any indexing or querying begins.
    /// Uses a short dedicated timeout rather than the client's global one.
    #[inline]
    pub fn probe_reachable(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build ping URL")?;

        debug!("Probing Ollama server at {}", url);

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(PROBE_TIMEOUT))
            .build()
            .into();

        agent
            .get(url.as_str())
            .call()
            .map(|_| ())
            .with_context(|| {
                format!(
                    "Cannot reach Ollama at {} -- is the server running?",
                    self.base_url
                )
            })?;

        debug!("Server probe successful");
        Ok(())
    }

    /// List all models installed on the server
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response_text = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Ensure `model` is installed, pulling it with progress reporting if
    /// it is missing. Fatal on pull failure.
    #[inline]
    pub fn ensure_model(&self, model: &str) -> Result<()> {
        let models = self.list_models().context("Failed to list models")?;

        if models.iter().any(|m| m.name == model) {
            debug!("Model {} is available", model);
            return Ok(());
        }

        warn!("Model {} not installed, pulling from registry", model);
        self.pull_model(model)
            .with_context(|| format!("Failed to pull model '{}'", model))
    }

    /// Pull a model from the Ollama registry, streaming progress updates.
    #[inline]
    pub fn pull_model(&self, model: &str) -> Result<()> {
        let url = self
            .base_url
            .join("/api/pull")
            .context("Failed to build pull URL")?;

        let request_json = serde_json::to_string(&PullRequest {
            model: model.to_string(),
        })
        .context("Failed to serialize pull request")?;

        // Pulls can take much longer than the global timeout allows.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(None)
            .build()
            .into();

        let response = agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .context("Failed to start model pull")?;

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::with_template("{spinner} Pulling {prefix}: {msg}")
                .context("Invalid progress template")?,
        );
        progress.set_prefix(model.to_string());
        progress.enable_steady_tick(Duration::from_millis(100));

        let reader = BufReader::new(response.into_body().into_reader());
        for line in reader.lines() {
            let line = line.context("Failed to read pull progress stream")?;
            if line.trim().is_empty() {
                continue;
            }

            let update: PullProgress =
                serde_json::from_str(&line).context("Failed to parse pull progress line")?;

            if let Some(error) = update.error {
                progress.finish_and_clear();
                return Err(anyhow::anyhow!("Model pull failed: {}", error));
            }

            match (update.completed, update.total) {
                (Some(completed), Some(total)) if total > 0 => {
                    progress.set_message(format!(
                        "{} ({}%)",
                        update.status,
                        completed * 100 / total
                    ));
                }
                _ => progress.set_message(update.status),
            }
        }

        progress.finish_and_clear();
        info!("Model {} pulled successfully", model);
        Ok(())
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to generate embedding")?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        debug!(
            "Generated embedding with {} dimensions",
            embed_response.embedding.len()
        );

        Ok(embed_response.embedding)
    }

    /// Generate embeddings for multiple text inputs, batched to avoid
    /// overwhelming the server
    #[inline]
    pub fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size as usize) {
            let batch_results = self
                .generate_embeddings_single_batch(batch)
                .with_context(|| format!("Failed to process batch of {} texts", batch.len()))?;

            results.extend(batch_results);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    fn generate_embeddings_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.len() == 1 {
            let embedding = self.generate_embedding(&texts[0])?;
            return Ok(vec![embedding]);
        }

        let request = BatchEmbedRequest {
            model: self.model.clone(),
            inputs: texts.to_vec(),
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build batch embedding URL")?;

        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize batch embedding request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to generate batch embeddings")?;

        let batch_response: BatchEmbedResponse = serde_json::from_str(&response_text)
            .context("Failed to parse batch embedding response")?;

        if batch_response.embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                batch_response.embeddings.len()
            ));
        }

        Ok(batch_response.embeddings)
    }
}

impl Embedder for OllamaClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_embeddings_batch(texts)
    }
}
