//! Session wiring: the single place every per-session component is
//! constructed and handed to every other component as an `Arc`, instead of
//! mutual back-references (spec §9 "Cyclic references" design note).
//!
//! Grounded on the teacher's `Session`/`SessionManager` (`crates/server/src/
//! session.rs`): one struct built once per call, background tasks spawned
//! against a shared `watch::Receiver<bool>` shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use copilot_config::Settings;
use copilot_conversation::{ConversationLog, Registry};
use copilot_core::{
    ControllerEvent, InboundAppMessage, LanguageModel, LifecycleEvent, ParticipantId,
    SpeechToText, TextToSpeech, Transport,
};
use copilot_pipeline::{PttTurn, Router, SpeechGate, StateController};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

use crate::hand_raise::HandRaise;
use crate::passive_analyzer::PassiveAnalyzer;
use crate::ptt_responder::PttResponder;

/// Backend instances a session is built against. Two separate
/// `LanguageModel`s, per spec §6: a stronger one for the PTT Responder, a
/// cheaper one for the Passive Analyzer.
pub struct SessionBackends {
    pub transport: Arc<dyn Transport>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub ptt_llm: Arc<dyn LanguageModel>,
    pub passive_llm: Arc<dyn LanguageModel>,
}

pub struct SessionContext {
    pub settings: Arc<Settings>,
    pub registry: Arc<Registry>,
    pub log: Arc<ConversationLog>,
    pub state: Arc<StateController>,
    pub speech_gate: Arc<SpeechGate>,
    pub router: Arc<Router>,
    pub hand_raise: Arc<HandRaise>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionContext {
    /// Build a session and spawn every background task it needs. The
    /// returned `SessionContext` owns the tasks' lifetimes; call `shutdown`
    /// to stop them.
    pub fn spawn(settings: Settings, backends: SessionBackends) -> Self {
        let settings = Arc::new(settings);
        let registry = Arc::new(Registry::new(
            settings.buyer_name.clone(),
            settings.seller_name.clone(),
            settings.target_name.clone(),
        ));
        let (log, log_changes) = ConversationLog::new(registry.clone());
        let log = Arc::new(log);
        let (state, state_changes) = StateController::new();
        let state = Arc::new(state);
        let speech_gate = Arc::new(SpeechGate::new(Duration::from_millis(settings.min_silence_ms)));
        let interrupt = Arc::new(Notify::new());

        let bot_id = backends.transport.bot_id();
        if let Some(id) = &bot_id {
            registry.register_bot(id.clone(), "AI Co-Pilot");
        }

        let (ptt_tx, ptt_rx) = mpsc::channel::<PttTurn>(8);
        let router = Arc::new(Router::new(bot_id.clone(), registry.clone(), log.clone(), state.clone(), ptt_tx));

        let hand_raise = Arc::new(HandRaise::new(
            state.clone(),
            backends.transport.clone(),
            backends.tts.clone(),
            interrupt.clone(),
        ));

        let ptt_responder = Arc::new(PttResponder::new(
            settings.clone(),
            log.clone(),
            state.clone(),
            backends.ptt_llm.clone(),
            hand_raise.clone(),
        ));

        let passive_analyzer = Arc::new(PassiveAnalyzer::new(
            settings.clone(),
            registry.clone(),
            log.clone(),
            state.clone(),
            backends.passive_llm.clone(),
            hand_raise.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = Vec::new();
        tasks.push(spawn_ptt_consumer(ptt_rx, ptt_responder));
        tasks.push(spawn_app_message_pump(
            backends.transport.clone(),
            router.clone(),
            hand_raise.clone(),
        ));
        tasks.push(spawn_lifecycle_pump(
            backends.transport.clone(),
            state.clone(),
            speech_gate.clone(),
            registry.clone(),
            interrupt.clone(),
            bot_id.clone(),
        ));
        tasks.push(spawn_broadcast_pump(state_changes, backends.transport.clone()));
        tasks.push(spawn_broadcast_pump(log_changes, backends.transport.clone()));
        tasks.push(spawn_audio_pump(
            backends.transport.clone(),
            backends.stt.clone(),
            speech_gate.clone(),
            router.clone(),
        ));
        tasks.push(passive_analyzer.spawn(shutdown_rx));

        Self {
            settings,
            registry,
            log,
            state,
            speech_gate,
            router,
            hand_raise,
            shutdown_tx,
            tasks,
        }
    }

    /// Signal every background task to stop and force-abort the pumps.
    /// Takes `&self` (not ownership) since callers typically hold this
    /// behind an `Arc` alongside other session bookkeeping.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_ptt_consumer(mut ptt_rx: mpsc::Receiver<PttTurn>, responder: Arc<PttResponder>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(turn) = ptt_rx.recv().await {
            responder.respond(turn).await;
        }
    })
}

fn spawn_app_message_pump(
    transport: Arc<dyn Transport>,
    router: Arc<Router>,
    hand_raise: Arc<HandRaise>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = transport.recv_app_message().await {
            match envelope.message {
                InboundAppMessage::Ptt { active } => {
                    router.on_ptt(envelope.sender_id, active).await;
                }
                InboundAppMessage::ApproveHand => {
                    hand_raise.approve().await;
                }
                InboundAppMessage::CancelBotSpeech => {
                    hand_raise.cancel().await;
                }
            }
        }
    })
}

fn spawn_lifecycle_pump(
    transport: Arc<dyn Transport>,
    state: Arc<StateController>,
    speech_gate: Arc<SpeechGate>,
    registry: Arc<Registry>,
    interrupt: Arc<Notify>,
    bot_id: Option<ParticipantId>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = transport.recv_lifecycle().await {
            match event {
                LifecycleEvent::ParticipantJoined { id, display_name } => {
                    registry.register(id, display_name);
                }
                LifecycleEvent::ParticipantLeft { id } => {
                    registry.remove(&id);
                }
                LifecycleEvent::SpeakingStarted { id } => {
                    if bot_id.as_ref() != Some(&id) {
                        speech_gate.on_vad_event(true);
                        if state.state() == copilot_core::BotState::Speaking {
                            interrupt.notify_waiters();
                            let _ = transport.cancel_audio().await;
                            state.apply(ControllerEvent::HumanSpeechStarted);
                        } else {
                            state.apply(ControllerEvent::HumanSpeechContinues);
                        }
                    }
                }
                LifecycleEvent::SpeakingStopped { id } => {
                    if bot_id.as_ref() != Some(&id) {
                        speech_gate.on_vad_event(false);
                    }
                }
            }
        }
    })
}

/// Forward a broadcast stream of outbound app-messages to the transport.
/// Shared by the State Controller's `bot_state_changed` fan-out and the
/// Conversation Log's `conversation_context_update` fan-out.
fn spawn_broadcast_pump(
    mut changes: tokio::sync::broadcast::Receiver<copilot_core::OutboundAppMessage>,
    transport: Arc<dyn Transport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(message) => {
                    let _ = transport.send_app_message(message).await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn spawn_audio_pump(
    transport: Arc<dyn Transport>,
    stt: Arc<dyn SpeechToText>,
    speech_gate: Arc<SpeechGate>,
    router: Arc<Router>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = transport.recv_audio().await {
            match stt.transcribe(&frame).await {
                Ok(transcription) => {
                    speech_gate.on_transcript_arrival();
                    router.handle_transcript(transcription.speaker_id, transcription.text).await;
                }
                Err(e) => {
                    tracing::warn!("STT transcription failed: {e}");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use copilot_core::{AudioFrame, Channel, Channels, GenerateRequest, Result, SampleRate, TranscriptionFrame};
    use copilot_transport::ChannelTransport;

    struct EchoStt;
    #[async_trait]
    impl SpeechToText for EchoStt {
        async fn transcribe(&self, audio: &AudioFrame) -> Result<TranscriptionFrame> {
            Ok(TranscriptionFrame {
                speaker_id: ParticipantId::new(audio.participant_id.clone().unwrap_or_default()),
                text: String::from_utf8_lossy(&audio.pcm).to_string(),
                timestamp: chrono::Utc::now(),
            })
        }
        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct NoopTts;
    #[async_trait]
    impl TextToSpeech for NoopTts {
        async fn synthesize(&self, _text: &str) -> Result<AudioFrame> {
            Ok(AudioFrame::new(SampleRate::Hz16000, Channels::Mono, vec![]))
        }
        fn model_name(&self) -> &str {
            "noop"
        }
    }

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

    fn harness() -> (SessionContext, copilot_transport::ChannelTransportHandle) {
        let (transport, handle) = ChannelTransport::new(Some(ParticipantId::new("bot")));
        let backends = SessionBackends {
            transport: Arc::new(transport),
            stt: Arc::new(EchoStt),
            tts: Arc::new(NoopTts),
            ptt_llm: Arc::new(StubLlm("a response".to_string())),
            passive_llm: Arc::new(StubLlm(r#"{"type":"summary","content":"x"}"#.to_string())),
        };
        let ctx = SessionContext::spawn(Settings::default(), backends);
        (ctx, handle)
    }

    #[tokio::test]
    async fn ptt_round_trip_produces_bot_response_and_hand_raised() {
        let (ctx, handle) = harness();

        handle
            .inbound_tx
            .send(copilot_core::InboundEnvelope {
                sender_id: ParticipantId::new("p1"),
                message: InboundAppMessage::Ptt { active: true },
            })
            .unwrap();

        handle
            .inbound_audio_tx
            .send(AudioFrame {
                participant_id: Some("p1".to_string()),
                sample_rate: SampleRate::Hz16000,
                channels: Channels::Mono,
                pcm: b"can you hear me".to_vec(),
            })
            .unwrap();

        handle
            .inbound_tx
            .send(copilot_core::InboundEnvelope {
                sender_id: ParticipantId::new("p1"),
                message: InboundAppMessage::Ptt { active: false },
            })
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if ctx.state.snapshot().hand_raised {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(outcome.is_ok(), "expected hand to be raised within timeout");
        assert_eq!(ctx.log.all().iter().filter(|u| u.channel == Channel::Bot).count(), 1);
        ctx.shutdown().await;
    }
}
