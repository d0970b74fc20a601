//! Language model trait.
//!
//! Only a single-shot `generate` is needed: the Passive Analyzer and PTT
//! Responder each make exactly one call per invocation (spec §4.5, §4.6),
//! no streaming or tool-calling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Parameters for a single chat-completion call (spec §6 LLM service contract).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request the backend constrain output to a JSON object (Passive Analyzer).
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: 0.7,
            max_tokens: 150,
            json_mode: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Language model backend. Two deployments are configured in practice (a
/// cheaper model for the Passive Analyzer, a stronger one for the PTT
/// Responder, per spec §6) but both are the same trait, just different
/// instances.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLlm;

    #[async_trait]
    impl LanguageModel for MockLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            Ok("Mock response".to_string())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock-llm"
        }
    }

    #[tokio::test]
    async fn mock_llm_generates() {
        let llm = MockLlm;
        assert!(llm.is_available().await);
        let request = GenerateRequest::new(vec![ChatMessage::user("hello")]);
        let response = llm.generate(request).await.unwrap();
        assert_eq!(response, "Mock response");
    }
}
