//! Conversation Log: the append-only, timestamp-monotone session record.
//!
//! `append` is the sole entry point that mutates the log (spec §5 Ordering
//! guarantees), guarded by a `parking_lot::Mutex` in the teacher's
//! synchronous-hot-state style (`InterruptHandler`'s `Mutex<HandlerState>`).
//!
//! Broadcasts a `conversation_context_update` after every append, the same
//! `tokio::sync::broadcast` fan-out `StateController` uses for
//! `bot_state_changed`.

use copilot_core::utterance::Channel;
use copilot_core::{BotState, ConversationEntry, OutboundAppMessage, ParticipantId, Utterance};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::registry::Registry;

const CONTEXT_UPDATE_WINDOW: usize = 20;

fn channel_rank(channel: Channel) -> u8 {
    match channel {
        Channel::Ptt => 0,
        Channel::Bot => 1,
        Channel::Passive => 2,
    }
}

pub struct ConversationLog {
    entries: Mutex<Vec<Utterance>>,
    registry: Arc<Registry>,
    changes: broadcast::Sender<OutboundAppMessage>,
}

impl ConversationLog {
    pub fn new(registry: Arc<Registry>) -> (Self, broadcast::Receiver<OutboundAppMessage>) {
        let (changes, rx) = broadcast::channel(32);
        (
            Self {
                entries: Mutex::new(Vec::new()),
                registry,
                changes,
            },
            rx,
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundAppMessage> {
        self.changes.subscribe()
    }

    /// Insert an utterance keeping the log monotone in timestamp (I5/P3).
    /// Entries sharing a timestamp are ordered PTT before Bot before Passive
    /// (spec §5), implemented as an in-order insertion rather than a plain
    /// push so two same-instant arrivals from different participants still
    /// land in the documented order; existing entries are never reordered,
    /// mutated, or removed. Broadcasts `conversation_context_update` (spec
    /// §6) with the current bot state and the last 20 entries once the
    /// insert is done.
    pub fn append(&self, utterance: Utterance, conversation_state: BotState) {
        {
            let mut entries = self.entries.lock();
            let pos = entries
                .iter()
                .rposition(|e| {
                    e.timestamp < utterance.timestamp
                        || (e.timestamp == utterance.timestamp
                            && channel_rank(e.channel) <= channel_rank(utterance.channel))
                })
                .map(|i| i + 1)
                .unwrap_or(0);
            entries.insert(pos, utterance);
        }
        self.broadcast_context_update(conversation_state);
    }

    fn broadcast_context_update(&self, conversation_state: BotState) {
        let recent = self.last(CONTEXT_UPDATE_WINDOW);
        let conversation_history = recent
            .into_iter()
            .map(|u| ConversationEntry {
                speaker_name: self.registry.display_name_or_prefix(&u.speaker_id),
                speaker_role: self.registry.role_of(&u.speaker_id),
                text: u.text,
                timestamp: u.timestamp,
                is_ptt: u.channel == Channel::Ptt,
                is_bot: u.channel == Channel::Bot,
                is_question: u.is_question,
                is_answer: u.is_answer,
                channel: u.channel,
                conversation_state,
            })
            .collect();
        let _ = self.changes.send(OutboundAppMessage::ConversationContextUpdate {
            conversation_history,
            total_utterances: self.len(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of all entries, for persistence.
    pub fn all(&self) -> Vec<Utterance> {
        self.entries.lock().clone()
    }

    /// Last `n` entries, for the Passive Analyzer's compact view (spec §4.5
    /// step 2) and the `conversation_context_update` payload (spec §6).
    pub fn last(&self, n: usize) -> Vec<Utterance> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Count of passive-channel entries appended since `since_len` (spec
    /// §4.5 step 1's "fewer than 3 passive utterances" skip, measured as a
    /// delta against the log length recorded at the previous tick).
    pub fn passive_count_since(&self, since_len: usize) -> usize {
        let entries = self.entries.lock();
        entries[since_len.min(entries.len())..]
            .iter()
            .filter(|e| e.channel == Channel::Passive)
            .count()
    }

    /// Render the full "Previous conversation" block used by the PTT
    /// Responder (spec §4.6 step 2).
    pub fn render_as_context_block(&self) -> String {
        self.entries
            .lock()
            .iter()
            .map(|u| format!("{}: {}", u.speaker_id, u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
