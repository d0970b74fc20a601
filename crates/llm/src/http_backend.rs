//! OpenAI-compatible chat-completions backend.
//!
//! Grounded directly on the teacher's `OllamaBackend`
//! (`crates/llm/src/backend.rs`): same retry-with-backoff loop, same
//! `is_retryable` 5xx/network split, same `Result`-returning constructor.
//! Targets the OpenAI chat-completions wire shape instead of Ollama's,
//! since both the PTT Responder and Passive Analyzer speak to an
//! OpenAI-compatible endpoint (spec §6 LLM service contract).

use async_trait::async_trait;
use copilot_core::traits::{ChatMessage, GenerateRequest, LanguageModel, LlmRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LlmError;

#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for HttpLlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// One concrete `LanguageModel`, shared by the PTT Responder (higher
/// temperature, larger model) and the Passive Analyzer (json mode, cheaper
/// model) — each gets its own instance with a different `HttpLlmConfig`.
#[derive(Clone)]
pub struct HttpLlmBackend {
    client: Client,
    config: HttpLlmConfig,
}

impl HttpLlmBackend {
    pub fn new(config: HttpLlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint)
    }

    async fn execute_request(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut builder = self.client.post(self.chat_url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")));
            }
            return Err(LlmError::Api(body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LanguageModel for HttpLlmBackend {
    async fn generate(&self, request: GenerateRequest) -> copilot_core::Result<String> {
        let chat_request = ChatRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(Into::into).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then(|| ResponseFormat { format_type: "json_object".to_string() }),
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, max_retries = self.config.max_retries, ?backoff, "retrying LLM request");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&chat_request).await {
                Ok(response) => {
                    let text = response
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .unwrap_or_default();
                    return Ok(text);
                }
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(copilot_core::Error::Transport(e.to_string())),
            }
        }

        Err(copilot_core::Error::Transport(
            last_error
                .unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string()))
                .to_string(),
        ))
    }

    async fn is_available(&self) -> bool {
        let mut builder = self.client.get(format!("{}/models", self.config.endpoint));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatApiMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatApiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for ChatApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        };
        Self { role: role.to_string(), content: msg.content.clone() }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatApiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_gpt4o() {
        let config = HttpLlmConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn message_conversion_maps_roles() {
        let msg = ChatMessage::user("hello");
        let api_msg: ChatApiMessage = (&msg).into();
        assert_eq!(api_msg.role, "user");
        assert_eq!(api_msg.content, "hello");
    }
}
