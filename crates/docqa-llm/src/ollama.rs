use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};

/// Locally resident models served by an Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
    max_tokens: u32,
}

impl OllamaProvider {
    /// Generation is greedy and capped at `max_tokens` predicted tokens.
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String, max_tokens: u32) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
            max_tokens,
        }
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn chat_request(&self, messages: &[Message]) -> ChatMessageRequest {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();
        let options = ModelOptions::default()
            .num_predict(i32::try_from(self.max_tokens).unwrap_or(i32::MAX))
            .temperature(0.0);
        ChatMessageRequest::new(self.model.clone(), ollama_messages).options(options)
    }

    /// Check if Ollama is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection to Ollama fails.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.client.list_local_models().await.map_err(|e| {
            LlmError::Other(format!("failed to connect to Ollama, is it running? {e}"))
        })?;
        Ok(())
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = self.chat_request(messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| LlmError::Other(format!("Ollama chat request failed: {e}")))?;

        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::from(text),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| LlmError::Other(format!("Ollama embedding request failed: {e}")))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embedding_model(&self) -> Option<&str> {
        Some(&self.embedding_model)
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(text),
        Role::Assistant => ChatMessage::assistant(text),
        Role::User => ChatMessage::user(text),
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), 11434)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_port_with_port() {
        let (host, port) = parse_host_port("http://localhost:11434");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn parse_host_port_without_port() {
        let (host, port) = parse_host_port("http://localhost");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn parse_host_port_custom_port_and_trailing_slash() {
        let (host, port) = parse_host_port("http://example.com:8080/");
        assert_eq!(host, "http://example.com");
        assert_eq!(port, 8080);
    }

    #[test]
    fn parse_host_port_invalid_port_falls_back() {
        let (host, port) = parse_host_port("http://localhost:notaport");
        assert_eq!(host, "http://localhost:notaport");
        assert_eq!(port, 11434);
    }

    #[test]
    fn convert_message_keeps_content() {
        let cm = convert_message(&Message::user("hello"));
        assert_eq!(cm.content, "hello");
        let cm = convert_message(&Message::system("rules"));
        assert_eq!(cm.content, "rules");
    }

    #[test]
    fn reports_models_and_name() {
        let provider = OllamaProvider::new(
            "http://localhost:11434",
            "mistral:7b".into(),
            "nomic-embed-text".into(),
            256,
        );
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "mistral:7b");
        assert_eq!(provider.embedding_model(), Some("nomic-embed-text"));
        assert!(provider.supports_embeddings());
    }

    #[test]
    fn chat_request_caps_tokens_and_is_greedy() {
        let provider =
            OllamaProvider::new("http://localhost:11434", "mistral:7b".into(), "e".into(), 256);
        assert_eq!(provider.max_tokens(), 256);

        let request = provider.chat_request(&[Message::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mistral:7b");
        assert_eq!(json["options"]["num_predict"], 256);
        assert_eq!(json["options"]["temperature"].as_f64(), Some(0.0));
    }

    #[test]
    fn oversized_token_limit_saturates() {
        let provider =
            OllamaProvider::new("http://localhost:11434", "m".into(), "e".into(), u32::MAX);
        let json = serde_json::to_value(provider.chat_request(&[])).unwrap();
        assert_eq!(json["options"]["num_predict"], i64::from(i32::MAX));
    }

    #[test]
    fn debug_format() {
        let provider =
            OllamaProvider::new("http://localhost:11434", "test".into(), "test-embed".into(), 64);
        let debug = format!("{provider:?}");
        assert!(debug.contains("OllamaProvider"));
    }

    #[tokio::test]
    async fn health_check_unreachable_errors() {
        let provider = OllamaProvider::new("http://127.0.0.1:1", "m".into(), "e".into(), 16);
        assert!(provider.health_check().await.is_err());
    }

    #[tokio::test]
    async fn chat_unreachable_errors() {
        let provider = OllamaProvider::new("http://127.0.0.1:1", "m".into(), "e".into(), 16);
        assert!(provider.chat(&[Message::user("hi")]).await.is_err());
    }
}
