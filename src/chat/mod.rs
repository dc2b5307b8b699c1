// Chat completion capability
// Two backends behind one closed trait, selected once at startup from
// configuration: the local Ollama chat API and a generic bearer-token
// OpenAI-compatible endpoint.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{ChatProvider, Config, ConfigError, OpenAiConfig};

const CHAT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Completes a chat given an ordered list of role-tagged messages.
pub trait ChatCompleter: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Select and construct the chat backend from configuration. The `openai`
/// provider requires both an endpoint and a credential.
#[inline]
pub fn completer_from_config(config: &Config) -> Result<Box<dyn ChatCompleter>> {
    match config.provider {
        ChatProvider::Ollama => Ok(Box::new(OllamaChat::new(
            &config.ollama.base_url,
            &config.ollama.chat_model,
        )?)),
        ChatProvider::OpenAi => {
            let openai = config
                .openai
                .as_ref()
                .ok_or(ConfigError::MissingOpenAiBaseUrl)?;
            Ok(Box::new(OpenAiChat::new(openai, &config.ollama.chat_model)?))
        }
    }
}

fn chat_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(CHAT_TIMEOUT_SECONDS)))
        .build()
        .into()
}

/// Coerce a completion payload to a string unconditionally; backends are
/// allowed to return structured content.
fn coerce_content(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Chat completions via the local Ollama inference server.
pub struct OllamaChat {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaChatMessage {
    content: Value,
}

impl OllamaChat {
    #[inline]
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid Ollama base URL")?;

        Ok(Self {
            base_url,
            model: model.to_string(),
            agent: chat_agent(),
        })
    }
}

impl ChatCompleter for OllamaChat {
    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self
            .base_url
            .join("/api/chat")
            .context("Failed to build chat URL")?;

        debug!(
            "Requesting Ollama chat completion with {} messages",
            messages.len()
        );

        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Chat completion request failed")?;

        let response: OllamaChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        Ok(coerce_content(response.message.content))
    }
}

/// Chat completions via a generic OpenAI-compatible HTTP endpoint with
/// bearer-token authentication.
pub struct OpenAiChat {
    base_url: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Value,
}

impl OpenAiChat {
    #[inline]
    pub fn new(config: &OpenAiConfig, model: &str) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url).context("Invalid chat endpoint URL")?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            model: model.to_string(),
            agent: chat_agent(),
        })
    }

    fn completions_url(&self) -> Result<Url> {
        // Endpoint may be given with or without a trailing slash.
        let base = if self.base_url.path().ends_with('/') {
            self.base_url.clone()
        } else {
            Url::parse(&format!("{}/", self.base_url)).context("Invalid chat endpoint URL")?
        };

        base.join("chat/completions")
            .context("Failed to build completions URL")
    }
}

impl ChatCompleter for OpenAiChat {
    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.completions_url()?;

        debug!(
            "Requesting chat completion from {} with {} messages",
            url,
            messages.len()
        );

        let request = OpenAiChatRequest {
            model: &self.model,
            messages,
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let auth_header = format!("Bearer {}", self.api_key);
        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", auth_header.as_str())
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Chat completion request failed")?;

        let response: OpenAiChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .context("Chat response contained no choices")?;

        Ok(coerce_content(choice.message.content))
    }
}
