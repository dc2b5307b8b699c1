use super::*;
use crate::chunking::ChunkingConfig;
use crate::config::{ChatProvider, Config, OllamaConfig};
use serde_json::json;
use std::path::PathBuf;

fn base_config(provider: ChatProvider, openai: Option<OpenAiConfig>) -> Config {
    Config {
        ollama: OllamaConfig::default(),
        provider,
        openai,
        docs_dir: PathBuf::from("./docs"),
        index_dir: PathBuf::from("./.vector_index"),
        top_k: 5,
        max_history_turns: 10,
        chunking: ChunkingConfig::default(),
    }
}

#[test]
fn message_constructors_set_roles() {
    assert_eq!(ChatMessage::system("s").role, Role::System);
    assert_eq!(ChatMessage::user("u").role, Role::User);
    assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
}

#[test]
fn messages_serialize_with_lowercase_roles() {
    let message = ChatMessage::user("hello");

    let value = serde_json::to_value(&message).expect("should serialize");

    assert_eq!(value, json!({"role": "user", "content": "hello"}));
}

#[test]
fn string_content_passes_through() {
    assert_eq!(coerce_content(json!("plain answer")), "plain answer");
}

#[test]
fn non_string_content_is_coerced() {
    let coerced = coerce_content(json!([{"type": "text", "text": "hi"}]));

    assert!(coerced.contains("\"text\":\"hi\""));
}

#[test]
fn ollama_provider_selected_from_config() {
    let config = base_config(ChatProvider::Ollama, None);

    assert!(completer_from_config(&config).is_ok());
}

#[test]
fn openai_provider_requires_endpoint_and_credential() {
    let config = base_config(ChatProvider::OpenAi, None);

    assert!(completer_from_config(&config).is_err());
}

#[test]
fn openai_provider_rejects_empty_credential() {
    let config = base_config(
        ChatProvider::OpenAi,
        Some(OpenAiConfig {
            base_url: "https://api.example.com/v1".to_string(),
            api_key: "  ".to_string(),
        }),
    );

    assert!(completer_from_config(&config).is_err());
}

#[test]
fn completions_url_joins_with_and_without_trailing_slash() {
    let with_slash = OpenAiChat::new(
        &OpenAiConfig {
            base_url: "https://api.example.com/v1/".to_string(),
            api_key: "key".to_string(),
        },
        "model",
    )
    .expect("should build client");

    let without_slash = OpenAiChat::new(
        &OpenAiConfig {
            base_url: "https://api.example.com/v1".to_string(),
            api_key: "key".to_string(),
        },
        "model",
    )
    .expect("should build client");

    assert_eq!(
        with_slash.completions_url().expect("url").as_str(),
        "https://api.example.com/v1/chat/completions"
    );
    assert_eq!(
        without_slash.completions_url().expect("url").as_str(),
        "https://api.example.com/v1/chat/completions"
    );
}
