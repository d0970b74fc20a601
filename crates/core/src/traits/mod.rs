//! Core traits pluggable backends and the transport implement.

mod llm;
mod speech;
mod transport;

pub use llm::{ChatMessage, GenerateRequest, LanguageModel, Role as LlmRole};
pub use speech::{SpeechToText, TextToSpeech, TranscriptionFrame};
pub use transport::{LifecycleEvent, Transport};
