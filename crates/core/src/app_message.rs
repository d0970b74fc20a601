//! The app-message wire protocol carried over the transport's data channel.
//!
//! Shapes match spec §6 exactly: `#[serde(tag = "type", rename_all =
//! "snake_case")]` tagged enums, the same pattern the teacher workspace uses
//! for its `ConversationStage`/config enums.

use crate::participant::{ParticipantId, Role};
use crate::state::BotState;
use crate::utterance::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages received from a participant over the data channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundAppMessage {
    Ptt { active: bool },
    ApproveHand,
    CancelBotSpeech,
}

/// A single entry in the `conversation_history` array of
/// `conversation_context_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub speaker_name: String,
    pub speaker_role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_ptt: bool,
    pub is_bot: bool,
    pub is_question: bool,
    pub is_answer: bool,
    pub channel: Channel,
    pub conversation_state: BotState,
}

/// Messages emitted toward participants over the data channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundAppMessage {
    BotStateChanged {
        state: BotState,
    },
    BotHandRaised {
        reason: String,
    },
    ConversationContextUpdate {
        conversation_history: Vec<ConversationEntry>,
        total_utterances: usize,
    },
    /// Start-marker for a framed TTS emission (spec §4.7, §9 message-splitting
    /// hazard). Not part of spec §6's literal outbound list, but required by
    /// the framed-emission rule it describes; carried as an app-message so
    /// the transport and any UI observer see the same framing the TTS path does.
    ResponseStart,
    ResponseText {
        text: String,
    },
    ResponseEnd,
}

impl InboundAppMessage {
    /// Truncate a pending message to the 200-char preview used by
    /// `bot_hand_raised`.
    pub fn preview(message: &str) -> String {
        message.chars().take(200).collect()
    }
}

/// Participant-scoped envelope the transport attaches to every inbound
/// message (sender is implied by channel metadata, per spec §6).
#[derive(Debug, Clone)]
pub struct InboundEnvelope {
    pub sender_id: ParticipantId,
    pub message: InboundAppMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_ptt_round_trips() {
        let msg = InboundAppMessage::Ptt { active: true };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"ptt","active":true}"#);
        let back: InboundAppMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn outbound_state_changed_shape() {
        let msg = OutboundAppMessage::BotStateChanged {
            state: BotState::ActiveListening,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "bot_state_changed");
        assert_eq!(json["state"], "active_listening");
    }

    #[test]
    fn preview_truncates_to_200_chars() {
        let long = "a".repeat(300);
        assert_eq!(InboundAppMessage::preview(&long).len(), 200);
    }
}
