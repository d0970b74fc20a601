//! Conversation log entries and the per-participant PTT buffer.

use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which signal produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Ptt,
    Passive,
    Bot,
}

/// Tag applied by the Passive Analyzer to a log entry it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTag {
    None,
    PassiveSummary,
    PassiveQuestion,
}

impl Default for SummaryTag {
    fn default() -> Self {
        SummaryTag::None
    }
}

/// A single, immutable conversation log entry.
///
/// Immutable after construction by design: there are no `&mut self` setters,
/// only the builder-style constructors below. Ordering across entries is an
/// invariant of the log that appends them, not of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker_id: ParticipantId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
    pub is_question: bool,
    pub is_answer: bool,
    pub summary_tag: SummaryTag,
    pub directed_to_id: Option<ParticipantId>,
}

impl Utterance {
    pub fn new(speaker_id: ParticipantId, text: impl Into<String>, channel: Channel) -> Self {
        let text = text.into();
        let is_question = text.trim_end().ends_with('?');
        Self {
            speaker_id,
            text,
            timestamp: Utc::now(),
            channel,
            is_question,
            is_answer: false,
            summary_tag: SummaryTag::None,
            directed_to_id: None,
        }
    }

    pub fn bot(speaker_id: ParticipantId, text: impl Into<String>) -> Self {
        Self::new(speaker_id, text, Channel::Bot)
    }

    pub fn with_summary_tag(mut self, tag: SummaryTag) -> Self {
        self.summary_tag = tag;
        self
    }

    pub fn with_directed_to(mut self, id: ParticipantId) -> Self {
        self.directed_to_id = Some(id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Accumulates STT fragments received while a participant's PTT latch is on.
///
/// STT commonly resends a growing prefix of the same utterance rather than
/// disjoint sentences. `append` handles both shapes: a fragment that is
/// already covered by the buffered text is dropped; a fragment that is
/// itself a superset of the buffered text (the common growing-prefix case)
/// replaces it; anything else is treated as a genuinely new sentence and is
/// appended.
#[derive(Debug, Clone, Default)]
pub struct PttBuffer {
    text: String,
    latched: bool,
}

impl PttBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn set_latched(&mut self, latched: bool) {
        self.latched = latched;
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn append(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.text = fragment.to_string();
        } else if self.text.contains(fragment) {
            // already covered, nothing new
        } else if fragment.contains(self.text.as_str()) {
            self.text = fragment.to_string();
        } else {
            self.text.push(' ');
            self.text.push_str(fragment);
        }
    }

    /// Render the buffered text without consuming it.
    pub fn peek(&self) -> String {
        self.text.clone()
    }

    /// Consume and clear the buffer, returning the buffered text. The single
    /// place fragments leave the buffer, so a press is flushed at most once.
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.latched = false;
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_dedupes_growing_prefix() {
        let mut buf = PttBuffer::new();
        buf.append("Hello");
        buf.append("Hello can you");
        buf.append("Hello can you help");
        assert_eq!(buf.peek(), "Hello can you help");
    }

    #[test]
    fn take_clears_buffer_once() {
        let mut buf = PttBuffer::new();
        buf.append("What is the pricing?");
        buf.set_latched(true);
        let text = buf.take();
        assert_eq!(text, "What is the pricing?");
        assert!(buf.is_empty());
        assert!(!buf.is_latched());
    }

    #[test]
    fn utterance_infers_question_from_trailing_mark() {
        let u = Utterance::new(ParticipantId::new("p1"), "Can you hear me?", Channel::Ptt);
        assert!(u.is_question);
    }
}
