//! Response Gate: suppresses auto-triggered LLM turns (spec §4.4).
//!
//! Directly grounded in the teacher's `ResponseGatingProcessor` auto-trigger
//! filter, generalized from a Pipecat frame filter to a plain predicate
//! since this workspace does not adopt the teacher's frame model.

use copilot_core::BotStateSnapshot;

/// The kinds of auto-run triggers an upstream speech framework can fire on
/// every utterance boundary. The gate exists to suppress all of them unless
/// a hand has already been explicitly approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTrigger {
    UserStoppedSpeaking,
    TranscriptFinal,
}

pub struct ResponseGate;

impl ResponseGate {
    /// True only when the trigger may proceed to the main LLM path: i.e.
    /// a hand has been raised *and* approved. Everything else is dropped,
    /// since this workspace only speaks after the PTT Responder or Passive
    /// Analyzer explicitly raises a hand and a human approves it.
    pub fn allow(&self, _trigger: AutoTrigger, snapshot: &BotStateSnapshot) -> bool {
        snapshot.hand_approved
    }
}

impl Default for ResponseGate {
    fn default() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(hand_approved: bool) -> BotStateSnapshot {
        BotStateSnapshot {
            hand_approved,
            ..Default::default()
        }
    }

    #[test]
    fn blocks_auto_trigger_without_approval() {
        let gate = ResponseGate::default();
        assert!(!gate.allow(AutoTrigger::UserStoppedSpeaking, &snapshot(false)));
    }

    #[test]
    fn allows_auto_trigger_once_approved() {
        let gate = ResponseGate::default();
        assert!(gate.allow(AutoTrigger::UserStoppedSpeaking, &snapshot(true)));
    }
}
