//! Hand-Raise Protocol (spec §4.7).
//!
//! `raise`/`approve`/`cancel` on the shared session state. `approve` emits
//! the framed `ResponseStart`/`ResponseText`/`ResponseEnd` triad — this
//! workspace's realization of the teacher bot's `LLMFullResponseStartFrame`/
//! `TextFrame`/`LLMFullResponseEndFrame` triad (`bot.py`'s `approve_hand`,
//! ~line 700) — then drives the `TextToSpeech` adapter, racing the
//! synthesis future against an interrupt signal so a human speech start
//! during `speaking` cancels it without retry (spec §4.1 interrupt rule).

use std::sync::Arc;

use copilot_core::{ControllerEvent, InboundAppMessage, OutboundAppMessage, TextToSpeech, Transport};
use copilot_pipeline::StateController;
use tokio::sync::Notify;

pub struct HandRaise {
    state: Arc<StateController>,
    transport: Arc<dyn Transport>,
    tts: Arc<dyn TextToSpeech>,
    interrupt: Arc<Notify>,
}

impl HandRaise {
    pub fn new(
        state: Arc<StateController>,
        transport: Arc<dyn Transport>,
        tts: Arc<dyn TextToSpeech>,
        interrupt: Arc<Notify>,
    ) -> Self {
        Self { state, transport, tts, interrupt }
    }

    /// Raise the hand with `message` as the pending content. Idempotent: a
    /// second raise while already raised is a no-op (spec §4.7).
    pub async fn raise(&self, message: String) {
        if self.state.snapshot().hand_raised {
            return;
        }
        let reason = InboundAppMessage::preview(&message);
        self.state.set_pending_message(message);
        self.state.apply(ControllerEvent::LlmMessageReady);
        let _ = self
            .transport
            .send_app_message(OutboundAppMessage::BotHandRaised { reason })
            .await;
    }

    /// Approve the raised hand. Requires `hand_raised=true` and a non-empty
    /// pending message; otherwise a no-op returning `false`.
    pub async fn approve(&self) -> bool {
        let snapshot = self.state.snapshot();
        if !snapshot.hand_raised || snapshot.pending_message.is_empty() {
            return false;
        }
        let message = snapshot.pending_message;
        self.state.apply(ControllerEvent::ApproveHand);

        let _ = self.transport.send_app_message(OutboundAppMessage::ResponseStart).await;
        let _ = self
            .transport
            .send_app_message(OutboundAppMessage::ResponseText { text: message.clone() })
            .await;
        let _ = self.transport.send_app_message(OutboundAppMessage::ResponseEnd).await;

        let state = self.state.clone();
        let transport = self.transport.clone();
        let tts = self.tts.clone();
        let interrupt = self.interrupt.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tts.synthesize(&message) => {
                    if let Ok(frame) = result {
                        let _ = transport.send_audio(frame).await;
                    } else {
                        tracing::warn!("TTS synthesis failed, ending turn silently");
                    }
                    state.apply(ControllerEvent::TtsComplete);
                }
                _ = interrupt.notified() => {
                    tracing::debug!("TTS synthesis interrupted by human speech");
                }
            }
        });
        true
    }

    /// Cancel a raised (not yet approved) hand, dropping the pending
    /// message (spec §4.1 `raised_hand` -> cancel / PTT-on transition).
    pub async fn cancel(&self) {
        self.state.apply(ControllerEvent::CancelHand);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_core::{AudioFrame, Channels, SampleRate};
    use copilot_transport::ChannelTransport;

    struct MockTts;

    #[async_trait::async_trait]
    impl TextToSpeech for MockTts {
        async fn synthesize(&self, _text: &str) -> copilot_core::Result<AudioFrame> {
            Ok(AudioFrame::new(SampleRate::Hz16000, Channels::Mono, vec![0u8; 4]))
        }

        fn model_name(&self) -> &str {
            "mock-tts"
        }
    }

    fn setup() -> (HandRaise, Arc<StateController>, copilot_transport::ChannelTransportHandle) {
        let (state, _rx) = StateController::new();
        let state = Arc::new(state);
        let (transport, handle) = ChannelTransport::new(None);
        let hand_raise = HandRaise::new(
            state.clone(),
            Arc::new(transport),
            Arc::new(MockTts),
            Arc::new(Notify::new()),
        );
        (hand_raise, state, handle)
    }

    #[tokio::test]
    async fn raise_is_idempotent() {
        let (hand_raise, state, _handle) = setup();
        hand_raise.raise("first".to_string()).await;
        hand_raise.raise("second".to_string()).await;
        assert_eq!(state.snapshot().pending_message, "first");
    }

    #[tokio::test]
    async fn approve_requires_raised_and_nonempty() {
        let (hand_raise, _state, _handle) = setup();
        assert!(!hand_raise.approve().await);
    }

    #[tokio::test]
    async fn approve_emits_framed_response() {
        let (hand_raise, _state, handle) = setup();
        hand_raise.raise("hello there".to_string()).await;
        let _ = handle.next_outbound().await; // bot_hand_raised
        assert!(hand_raise.approve().await);

        assert!(matches!(handle.next_outbound().await, Some(OutboundAppMessage::ResponseStart)));
        match handle.next_outbound().await {
            Some(OutboundAppMessage::ResponseText { text }) => assert_eq!(text, "hello there"),
            other => panic!("expected ResponseText, got {other:?}"),
        }
        assert!(matches!(handle.next_outbound().await, Some(OutboundAppMessage::ResponseEnd)));
    }

    #[tokio::test]
    async fn cancel_clears_pending_message() {
        let (hand_raise, state, _handle) = setup();
        hand_raise.raise("hello".to_string()).await;
        hand_raise.cancel().await;
        let snapshot = state.snapshot();
        assert!(!snapshot.hand_raised);
        assert!(snapshot.pending_message.is_empty());
    }
}
