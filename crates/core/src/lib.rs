//! Core domain types and traits shared by every crate in this workspace.
//!
//! - Participant identity and role resolution (`participant`)
//! - Conversation log entries and the PTT buffer (`utterance`)
//! - Bot lifecycle state and transition events (`state`)
//! - The app-message wire protocol (`app_message`)
//! - Pluggable backend traits: `Transport`, `SpeechToText`, `TextToSpeech`,
//!   `LanguageModel` (`traits`)
//! - The crate-wide error type (`error`)

pub mod app_message;
pub mod audio;
pub mod error;
pub mod participant;
pub mod state;
pub mod traits;
pub mod utterance;

pub use app_message::{ConversationEntry, InboundAppMessage, InboundEnvelope, OutboundAppMessage};
pub use audio::{AudioFrame, Channels, SampleRate};
pub use error::{Error, Result};
pub use participant::{Participant, ParticipantId, Role};
pub use state::{BotState, BotStateSnapshot, ControllerEvent, StateTransition};
pub use traits::{
    ChatMessage, GenerateRequest, LanguageModel, LifecycleEvent, LlmRole, SpeechToText,
    TextToSpeech, Transport, TranscriptionFrame,
};
pub use utterance::{Channel, PttBuffer, SummaryTag, Utterance};
