//! PTT Responder (spec §4.6), grounded directly in the original bot's
//! `TranscriptionMonitor.generate_ptt_response` (`bot.py` lines 339-448).
//!
//! The original's `finally` clears a buffered-text flag to avoid
//! reprocessing it; here that buffer already lives in, and is drained by,
//! `crates/pipeline::Router` before a `PttTurn` is ever handed to this
//! type, so there is nothing left for this type itself to clean up on any
//! exit path — both the success and failure arms converge on the same
//! `hand_raise.raise(message)` call.

use std::sync::Arc;

use copilot_config::{PromptBuilder, Settings};
use copilot_conversation::ConversationLog;
use copilot_core::{ChatMessage, Channel, GenerateRequest, LanguageModel, Utterance};
use copilot_pipeline::{PttTurn, StateController};

use crate::hand_raise::HandRaise;

const CANNED_FALLBACK: &str = "I have a response ready.";

pub struct PttResponder {
    settings: Arc<Settings>,
    log: Arc<ConversationLog>,
    state: Arc<StateController>,
    llm: Arc<dyn LanguageModel>,
    hand_raise: Arc<HandRaise>,
}

impl PttResponder {
    pub fn new(
        settings: Arc<Settings>,
        log: Arc<ConversationLog>,
        state: Arc<StateController>,
        llm: Arc<dyn LanguageModel>,
        hand_raise: Arc<HandRaise>,
    ) -> Self {
        Self { settings, log, state, llm, hand_raise }
    }

    /// Handle one complete PTT buffer (spec §4.6 steps 1-6).
    pub async fn respond(&self, turn: PttTurn) {
        // Step 1 (state already transitioned to thinking by the router's
        // PttOffBufferNonEmpty event before this turn was handed off).

        // Step 2: assemble the prompt.
        let system_prompt = PromptBuilder::new(&self.settings).ptt_system_prompt();
        let history = self.log.render_as_context_block();
        let framed = PromptBuilder::frame_ptt_utterance(&turn.speaker_label, &turn.text);
        let mut user_content = String::new();
        if !history.is_empty() {
            user_content.push_str("Previous conversation:\n");
            user_content.push_str(&history);
            user_content.push_str("\n\n");
        }
        user_content.push_str(&framed);

        // Step 3: call the LLM once, temperature ~0.7, ~150 output tokens.
        let request = GenerateRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_content),
        ])
        .with_temperature(0.7)
        .with_max_tokens(150);

        let message = match self.llm.generate(request).await {
            Ok(text) => {
                // Step 4: record the message in the log now, before approval.
                // The thinking -> raised_hand transition itself happens inside
                // `hand_raise.raise` below, which also stamps `pending_message`.
                self.log.append(Utterance::bot(turn.speaker_id.clone(), text.clone()), self.state.state());
                text
            }
            Err(e) => {
                tracing::warn!("PTT responder LLM call failed: {e}");
                self.log.append(
                    Utterance::new(turn.speaker_id.clone(), CANNED_FALLBACK, Channel::Bot),
                    self.state.state(),
                );
                CANNED_FALLBACK.to_string()
            }
        };

        self.hand_raise.raise(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use copilot_core::{OutboundAppMessage, ParticipantId, Result, Transport};
    use copilot_transport::ChannelTransport;

    struct StubLlm(String);

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            Ok(self.0.clone())
        }
        async fn is_available(&self) -> bool {
            true
        }
        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct FailingLlm;
    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            Err(copilot_core::Error::Transport("boom".to_string()))
        }
        async fn is_available(&self) -> bool {
            false
        }
        fn model_name(&self) -> &str {
            "failing"
        }
    }

    struct NoopTts;
    #[async_trait]
    impl copilot_core::TextToSpeech for NoopTts {
        async fn synthesize(&self, _text: &str) -> Result<copilot_core::AudioFrame> {
            Ok(copilot_core::AudioFrame::new(copilot_core::SampleRate::Hz16000, copilot_core::Channels::Mono, vec![]))
        }
        fn model_name(&self) -> &str {
            "noop"
        }
    }

    fn harness(llm: Arc<dyn LanguageModel>) -> (PttResponder, Arc<ConversationLog>, Arc<StateController>, copilot_transport::ChannelTransportHandle) {
        let settings = Arc::new(Settings::default());
        let registry = Arc::new(copilot_conversation::Registry::new("Alex", "Jordan", "Sam"));
        let (log, _log_rx) = ConversationLog::new(registry);
        let log = Arc::new(log);
        let (state, _rx) = StateController::new();
        let state = Arc::new(state);
        let (transport, handle) = ChannelTransport::new(None);
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let hand_raise = Arc::new(HandRaise::new(state.clone(), transport, Arc::new(NoopTts), Arc::new(tokio::sync::Notify::new())));
        let responder = PttResponder::new(settings, log.clone(), state.clone(), llm, hand_raise);
        (responder, log, state, handle)
    }

    #[tokio::test]
    async fn success_records_bot_utterance_and_raises_hand() {
        let (responder, log, state, handle) = harness(Arc::new(StubLlm("Yes, I can hear you clearly.".to_string())));
        let turn = PttTurn {
            speaker_id: ParticipantId::new("p1"),
            speaker_label: "Alex (buyer)".to_string(),
            text: "Can you hear me".to_string(),
        };
        responder.respond(turn).await;

        assert_eq!(log.len(), 1);
        assert_eq!(log.all()[0].text, "Yes, I can hear you clearly.");
        assert_eq!(log.all()[0].channel, Channel::Bot);
        assert!(state.snapshot().hand_raised);
        assert!(matches!(handle.next_outbound().await, Some(OutboundAppMessage::BotHandRaised { .. })));
    }

    #[tokio::test]
    async fn failure_falls_back_to_canned_message_and_still_raises_hand() {
        let (responder, log, state, _handle) = harness(Arc::new(FailingLlm));
        let turn = PttTurn {
            speaker_id: ParticipantId::new("p1"),
            speaker_label: "Alex (buyer)".to_string(),
            text: "What is the rate".to_string(),
        };
        responder.respond(turn).await;

        assert_eq!(log.all()[0].text, CANNED_FALLBACK);
        assert!(state.snapshot().hand_raised);
        assert_eq!(state.snapshot().pending_message, CANNED_FALLBACK);
    }
}
