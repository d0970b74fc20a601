//! Bot lifecycle state and the events that drive its transitions.

use serde::{Deserialize, Serialize};

/// The five-state bot lifecycle (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    PassiveListening,
    ActiveListening,
    Thinking,
    RaisedHand,
    Speaking,
}

impl Default for BotState {
    fn default() -> Self {
        BotState::PassiveListening
    }
}

/// Every input the State Controller's transition function must handle.
///
/// The function is total: a final wildcard arm returns the current state
/// unchanged for any `(state, event)` pair not named in the transition
/// table, so it never panics on an out-of-order event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    PttOn,
    PttOffBufferNonEmpty,
    HumanSpeechContinues,
    HumanSpeechStarted,
    HumanSpeechResumedBriefly,
    LlmMessageReady,
    LlmFailed,
    ApproveHand,
    CancelHand,
    TtsComplete,
    AnalyzerQuestion,
}

/// Aggregate snapshot broadcast as `bot_state_changed` and used by tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStateSnapshot {
    pub state: BotState,
    pub hand_raised: bool,
    pub hand_approved: bool,
    pub pending_message: String,
}

impl Default for BotStateSnapshot {
    fn default() -> Self {
        Self {
            state: BotState::default(),
            hand_raised: false,
            hand_approved: false,
            pending_message: String::new(),
        }
    }
}

/// One recorded transition, kept in a bounded ring buffer for property tests.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: BotState,
    pub event: ControllerEvent,
    pub to: BotState,
}
