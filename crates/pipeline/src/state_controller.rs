//! State Controller: the bot's five-state lifecycle (spec §4.1).
//!
//! `Mutex`-guarded state with a total transition function, grounded on the
//! teacher's `InterruptHandler` (`processors/interrupt_handler.rs`): private
//! state enum behind a `parking_lot::Mutex`, a pure function mapping
//! `(state, event) -> state`, and a `tokio::sync::broadcast` channel used to
//! fan the result out rather than calling back into whoever triggered it.

use copilot_core::{BotState, BotStateSnapshot, ControllerEvent, OutboundAppMessage, StateTransition};
use parking_lot::Mutex;
use tokio::sync::broadcast;

const TRANSITION_LOG_CAPACITY: usize = 64;

/// Pure transition function (spec §4.1's table). Total: any `(state, event)`
/// pair not named here falls through to the wildcard arm and returns `state`
/// unchanged, so an out-of-order event is a no-op rather than a panic.
fn transition(state: BotState, event: &ControllerEvent) -> BotState {
    use BotState::*;
    use ControllerEvent::*;
    match (state, event) {
        (PassiveListening, PttOn) => ActiveListening,
        (PassiveListening, AnalyzerQuestion) => Thinking,

        (ActiveListening, PttOffBufferNonEmpty) => Thinking,
        (ActiveListening, HumanSpeechContinues) => ActiveListening,

        (Thinking, LlmMessageReady) => RaisedHand,
        (Thinking, LlmFailed) => PassiveListening,

        (RaisedHand, ApproveHand) => Speaking,
        (RaisedHand, CancelHand) => PassiveListening,
        (RaisedHand, PttOn) => PassiveListening,
        (RaisedHand, HumanSpeechResumedBriefly) => RaisedHand,

        (Speaking, TtsComplete) => PassiveListening,
        (Speaking, HumanSpeechStarted) => PassiveListening,

        (state, _) => state,
    }
}

pub struct StateController {
    state: Mutex<BotStateSnapshot>,
    log: Mutex<Vec<StateTransition>>,
    changes: broadcast::Sender<OutboundAppMessage>,
}

impl StateController {
    pub fn new() -> (Self, broadcast::Receiver<OutboundAppMessage>) {
        let (changes, rx) = broadcast::channel(32);
        (
            Self {
                state: Mutex::new(BotStateSnapshot::default()),
                log: Mutex::new(Vec::with_capacity(TRANSITION_LOG_CAPACITY)),
                changes,
            },
            rx,
        )
    }

    pub fn snapshot(&self) -> BotStateSnapshot {
        self.state.lock().clone()
    }

    pub fn state(&self) -> BotState {
        self.state.lock().state
    }

    /// Apply an event, updating the snapshot's side fields (`hand_raised`,
    /// `hand_approved`, `pending_message`) to match, and broadcast the new
    /// state if it changed. Returns the resulting state either way.
    pub fn apply(&self, event: ControllerEvent) -> BotState {
        let mut guard = self.state.lock();
        let from = guard.state;
        let to = transition(from, &event);

        match &event {
            ControllerEvent::LlmMessageReady => guard.hand_raised = true,
            ControllerEvent::ApproveHand => guard.hand_approved = true,
            ControllerEvent::CancelHand => {
                guard.hand_raised = false;
                guard.hand_approved = false;
                guard.pending_message.clear();
            }
            ControllerEvent::TtsComplete => {
                guard.hand_raised = false;
                guard.hand_approved = false;
                guard.pending_message.clear();
            }
            ControllerEvent::LlmFailed => {
                guard.hand_raised = false;
                guard.pending_message.clear();
            }
            ControllerEvent::PttOn if from == BotState::RaisedHand => {
                guard.hand_raised = false;
                guard.pending_message.clear();
            }
            _ => {}
        }
        guard.state = to;
        let changed = from != to;
        drop(guard);

        {
            let mut log = self.log.lock();
            if log.len() == TRANSITION_LOG_CAPACITY {
                log.remove(0);
            }
            log.push(StateTransition { from, event, to });
        }

        if changed {
            let _ = self.changes.send(OutboundAppMessage::BotStateChanged { state: to });
        }
        to
    }

    /// Set the pending message produced by the PTT Responder or Passive
    /// Analyzer, ahead of the `LlmMessageReady` event that raises the hand.
    pub fn set_pending_message(&self, message: String) {
        self.state.lock().pending_message = message;
    }

    pub fn recent_transitions(&self) -> Vec<StateTransition> {
        self.log.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundAppMessage> {
        self.changes.subscribe()
    }
}

impl Default for StateController {
    fn default() -> Self {
        Self::new().0
    }
}
