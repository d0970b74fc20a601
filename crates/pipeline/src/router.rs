//! Transcription Router: the six-step routing rule from spec §4.3.
//!
//! Talks to the Participant Registry and Conversation Log directly, and
//! hands flushed PTT buffers to the PTT Responder over an injected
//! `mpsc::Sender<PttTurn>` — a channel handoff rather than a direct call,
//! matching the teacher's processor-chain channel wiring
//! (`processors::chain`).

use copilot_conversation::{ConversationLog, Registry};
use copilot_core::{Channel, ControllerEvent, ParticipantId, PttBuffer, Utterance};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::response_gate::{AutoTrigger, ResponseGate};
use crate::state_controller::StateController;

/// A complete PTT utterance handed off to the PTT Responder.
#[derive(Debug, Clone)]
pub struct PttTurn {
    pub speaker_id: ParticipantId,
    /// Pre-formatted "{name} ({ROLE})" label for prompt framing (spec §4.6
    /// step 2's `"{name} ({ROLE}): {text}"` shape).
    pub speaker_label: String,
    pub text: String,
}

#[derive(Default)]
struct PttSession {
    buffer: PttBuffer,
    /// Set on PTT-off when the buffer was empty at release time; cleared
    /// (and the buffer flushed) by the next transcript for this speaker.
    release_pending: bool,
}

pub struct Router {
    bot_id: Option<ParticipantId>,
    registry: Arc<Registry>,
    log: Arc<ConversationLog>,
    state: Arc<StateController>,
    ptt_tx: mpsc::Sender<PttTurn>,
    response_gate: ResponseGate,
    sessions: Mutex<HashMap<ParticipantId, PttSession>>,
}

impl Router {
    pub fn new(
        bot_id: Option<ParticipantId>,
        registry: Arc<Registry>,
        log: Arc<ConversationLog>,
        state: Arc<StateController>,
        ptt_tx: mpsc::Sender<PttTurn>,
    ) -> Self {
        Self {
            bot_id,
            registry,
            log,
            state,
            ptt_tx,
            response_gate: ResponseGate::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn speaker_label(&self, speaker_id: &ParticipantId) -> String {
        let name = self.registry.display_name_or_prefix(speaker_id);
        let role = self.registry.role_of(speaker_id);
        format!("{name} ({role})")
    }

    /// Inbound `{type: ptt, active}` control message for `speaker_id`.
    pub async fn on_ptt(&self, speaker_id: ParticipantId, active: bool) {
        let turn = {
            let mut sessions = self.sessions.lock();
            let session = sessions.entry(speaker_id.clone()).or_default();
            if active {
                session.buffer.set_latched(true);
                session.release_pending = false;
                None
            } else if !session.buffer.is_empty() {
                session.release_pending = false;
                Some(session.buffer.take())
            } else {
                session.release_pending = true;
                None
            }
        };

        if active {
            self.state.apply(ControllerEvent::PttOn);
            return;
        }

        if let Some(text) = turn {
            self.state.apply(ControllerEvent::PttOffBufferNonEmpty);
            let label = self.speaker_label(&speaker_id);
            let _ = self
                .ptt_tx
                .send(PttTurn { speaker_id, speaker_label: label, text })
                .await;
        }
    }

    /// A final transcript `text` arrived from `speaker_id` (spec §4.3).
    pub async fn handle_transcript(&self, speaker_id: ParticipantId, text: String) {
        if self.bot_id.as_ref() == Some(&speaker_id) {
            return; // step 1: echo guard
        }
        if text.trim().is_empty() {
            return;
        }

        let ptt_active = {
            let sessions = self.sessions.lock();
            sessions.get(&speaker_id).map(|s| s.buffer.is_latched()).unwrap_or(false)
        };

        if ptt_active {
            let flushed = {
                let mut sessions = self.sessions.lock();
                let session = sessions.entry(speaker_id.clone()).or_default();
                session.buffer.append(&text);
                if session.release_pending {
                    session.release_pending = false;
                    Some(session.buffer.take())
                } else {
                    None
                }
            };

            self.state.apply(ControllerEvent::PttOn);
            self.log
                .append(Utterance::new(speaker_id.clone(), text, Channel::Ptt), self.state.state());

            if let Some(buffered) = flushed {
                let label = self.speaker_label(&speaker_id);
                let _ = self
                    .ptt_tx
                    .send(PttTurn { speaker_id, speaker_label: label, text: buffered })
                    .await;
            }
        } else {
            self.log.append(Utterance::new(speaker_id.clone(), text, Channel::Passive), self.state.state());
            // Every passive transcript is an utterance boundary an upstream
            // speech framework would otherwise auto-trigger an LLM turn on
            // (spec §4.4). Nothing downstream of this workspace does that
            // implicitly, but the gate still runs here so the suppression is
            // enforced at the one place a future auto-trigger hook would plug in.
            if !self.response_gate.allow(AutoTrigger::TranscriptFinal, &self.state.snapshot()) {
                tracing::trace!("response gate suppressed auto-trigger for {speaker_id}");
            }
        }
    }
}
