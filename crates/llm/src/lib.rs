//! LLM backend for the consultation co-pilot.
//!
//! One trait (`copilot_core::traits::LanguageModel`) and one concrete
//! implementation (`HttpLlmBackend`) talking to an OpenAI-compatible
//! chat-completions endpoint, used by both the Passive Analyzer and the PTT
//! Responder with different configs (model, temperature, json mode).

pub mod http_backend;

pub use http_backend::{HttpLlmBackend, HttpLlmConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
