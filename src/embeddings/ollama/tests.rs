use super::*;
use crate::config::OllamaConfig;

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        base_url: "http://test-host:1234".to_string(),
        chat_model: "chat-model".to_string(),
        embed_model: "embed-model".to_string(),
        batch_size: 128,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "embed-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
}

#[test]
fn invalid_base_url_is_rejected() {
    let config = OllamaConfig {
        base_url: "not a url".to_string(),
        ..OllamaConfig::default()
    };

    assert!(OllamaClient::new(&config).is_err());
}

#[test]
fn with_timeout_rebuilds_agent() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60));

    // Timeout lives in the agent configuration; the rest is unchanged.
    assert_eq!(client.model, config.embed_model);
}

#[test]
fn empty_batch_produces_no_embeddings() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let results = client
        .generate_embeddings_batch(&[])
        .expect("empty batch should not touch the network");

    assert!(results.is_empty());
}

#[test]
fn probe_timeout_is_five_seconds() {
    assert_eq!(PROBE_TIMEOUT, Duration::from_secs(5));
}
