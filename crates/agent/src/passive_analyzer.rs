//! Passive Analyzer (spec §4.5): a timer-driven background task watching
//! the Conversation Log for things worth a clarifying question.
//!
//! Grounded on the teacher's `SessionManager::start_cleanup_task`
//! (`crates/server/src/session.rs`): a `tokio::time::interval` loop raced
//! against a `watch::Receiver<bool>` shutdown signal inside `tokio::select!`.

use std::sync::Arc;
use std::time::Duration;

use copilot_config::{PromptBuilder, Settings};
use copilot_conversation::{ConversationLog, Registry};
use copilot_core::{BotState, ChatMessage, ControllerEvent, GenerateRequest, LanguageModel, SummaryTag, Utterance};
use copilot_pipeline::StateController;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::hand_raise::HandRaise;

#[derive(Debug, Serialize)]
struct CompactEntry {
    speaker: String,
    role: String,
    text: String,
    is_question: bool,
    is_answer: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnalyzerVerdict {
    Summary { content: String },
    Question { content: String },
}

pub struct PassiveAnalyzer {
    settings: Arc<Settings>,
    registry: Arc<Registry>,
    log: Arc<ConversationLog>,
    state: Arc<StateController>,
    llm: Arc<dyn LanguageModel>,
    hand_raise: Arc<HandRaise>,
}

impl PassiveAnalyzer {
    pub fn new(
        settings: Arc<Settings>,
        registry: Arc<Registry>,
        log: Arc<ConversationLog>,
        state: Arc<StateController>,
        llm: Arc<dyn LanguageModel>,
        hand_raise: Arc<HandRaise>,
    ) -> Self {
        Self { settings, registry, log, state, llm, hand_raise }
    }

    /// Spawn the ticking task. The returned handle is joined on shutdown;
    /// sending `true` on `shutdown` ends the loop after the in-flight tick
    /// (if any) completes.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(self.settings.passive_analyzer_interval_s));
            let mut since_len = self.log.len();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        since_len = self.tick(since_len).await;
                    }
                    result = shutdown.changed() => {
                        if result.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Run one tick; returns the log length to measure the next tick's
    /// passive-utterance count from.
    async fn tick(&self, since_len: usize) -> usize {
        let current_len = self.log.len();

        if self.log.passive_count_since(since_len) < 3 {
            return current_len;
        }
        if self.state.state() != BotState::PassiveListening {
            // Must not fire while active_listening/thinking/raised_hand/speaking (P7).
            return current_len;
        }

        let view = self.compact_view();
        let view_json = match serde_json::to_string(&view) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize passive analyzer view: {e}");
                return current_len;
            }
        };

        let prompt_builder = PromptBuilder::new(&self.settings);
        let request = GenerateRequest::new(vec![
            ChatMessage::system(prompt_builder.passive_analyzer_system_prompt()),
            ChatMessage::user(view_json),
        ])
        .with_temperature(0.3)
        .with_max_tokens(150)
        .with_json_mode(true);

        match self.llm.generate(request).await {
            Ok(text) => self.apply_verdict(&text),
            Err(e) => tracing::warn!("passive analyzer LLM call failed: {e}"),
        }

        current_len
    }

    fn compact_view(&self) -> Vec<CompactEntry> {
        self.log
            .last(10)
            .into_iter()
            .map(|u| CompactEntry {
                speaker: self.registry.display_name_or_prefix(&u.speaker_id),
                role: self.registry.role_of(&u.speaker_id).to_string(),
                text: u.text,
                is_question: u.is_question,
                is_answer: u.is_answer,
            })
            .collect()
    }

    /// Non-JSON output is treated as an empty summary: no log entry, no
    /// intervention (spec §7 Error Handling Design).
    fn apply_verdict(&self, raw: &str) {
        let Some(verdict) = serde_json::from_str::<AnalyzerVerdict>(raw).ok() else {
            tracing::debug!("passive analyzer returned non-JSON output, treating as empty summary");
            return;
        };

        let analyzer_id = self.registry.infer_bot_id().unwrap_or_else(|| copilot_core::ParticipantId::new("analyzer"));

        match verdict {
            AnalyzerVerdict::Summary { content } => {
                self.log.append(
                    Utterance::bot(analyzer_id, content).with_summary_tag(SummaryTag::PassiveSummary),
                    self.state.state(),
                );
            }
            AnalyzerVerdict::Question { content } => {
                self.log.append(
                    Utterance::bot(analyzer_id, content.clone()).with_summary_tag(SummaryTag::PassiveQuestion),
                    self.state.state(),
                );
                // passive_listening -> thinking here; `hand_raise.raise` below
                // drives the thinking -> raised_hand half of the analyzer path
                // (spec §4.1).
                self.state.apply(ControllerEvent::AnalyzerQuestion);
                let hand_raise = self.hand_raise.clone();
                tokio::spawn(async move {
                    hand_raise.raise(content).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use copilot_core::{Channel, ControllerEvent, OutboundAppMessage, ParticipantId, Result, Transport};
    use copilot_transport::ChannelTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubLlm {
        response: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
        async fn is_available(&self) -> bool {
            true
        }
        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct NoopTts;
    #[async_trait]
    impl copilot_core::TextToSpeech for NoopTts {
        async fn synthesize(&self, _text: &str) -> Result<copilot_core::AudioFrame> {
            Ok(copilot_core::AudioFrame::new(
                copilot_core::SampleRate::Hz16000,
                copilot_core::Channels::Mono,
                vec![],
            ))
        }
        fn model_name(&self) -> &str {
            "noop"
        }
    }

    fn harness(response: &str) -> (Arc<PassiveAnalyzer>, Arc<ConversationLog>, Arc<StateController>, copilot_transport::ChannelTransportHandle) {
        let settings = Arc::new(Settings::default());
        let registry = Arc::new(Registry::new("Alex", "Jordan", "Sam"));
        let (log, _log_rx) = ConversationLog::new(registry.clone());
        let log = Arc::new(log);
        let (state, _rx) = StateController::new();
        let state = Arc::new(state);
        let (transport, handle) = ChannelTransport::new(None);
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let hand_raise = Arc::new(HandRaise::new(
            state.clone(),
            transport,
            Arc::new(NoopTts),
            Arc::new(tokio::sync::Notify::new()),
        ));
        let llm: Arc<dyn LanguageModel> = Arc::new(StubLlm { response: response.to_string(), calls: AtomicUsize::new(0) });
        let analyzer = Arc::new(PassiveAnalyzer::new(settings, registry, log.clone(), state.clone(), llm, hand_raise));
        (analyzer, log, state, handle)
    }

    fn push_passive(log: &ConversationLog, n: usize) {
        for i in 0..n {
            log.append(
                Utterance::new(ParticipantId::new("p1"), format!("msg {i}"), Channel::Passive),
                BotState::PassiveListening,
            );
        }
    }

    #[tokio::test]
    async fn skips_tick_with_fewer_than_three_passive_utterances() {
        let (analyzer, log, _state, _handle) = harness(r#"{"type":"summary","content":"x"}"#);
        push_passive(&log, 2);
        let next = analyzer.tick(0).await;
        assert_eq!(log.len(), 2);
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn summary_verdict_appends_tagged_log_entry_only() {
        let (analyzer, log, state, _handle) = harness(r#"{"type":"summary","content":"discussed pricing"}"#);
        push_passive(&log, 3);
        analyzer.tick(0).await;
        assert_eq!(log.len(), 4);
        let last = log.last(1);
        assert_eq!(last[0].summary_tag, SummaryTag::PassiveSummary);
        assert!(!state.snapshot().hand_raised);
    }

    #[tokio::test]
    async fn question_verdict_raises_hand() {
        let (analyzer, log, state, handle) = harness(r#"{"type":"question","content":"did you mean 5%?"}"#);
        push_passive(&log, 3);
        analyzer.tick(0).await;
        assert!(state.snapshot().hand_raised);
        assert!(matches!(handle.next_outbound().await, Some(OutboundAppMessage::BotHandRaised { .. })));
    }

    #[tokio::test]
    async fn never_fires_outside_passive_listening() {
        let (analyzer, log, state, _handle) = harness(r#"{"type":"summary","content":"x"}"#);
        push_passive(&log, 5);
        state.apply(ControllerEvent::PttOn);
        let len_before = log.len();
        analyzer.tick(0).await;
        assert_eq!(log.len(), len_before);
    }

    #[tokio::test]
    async fn non_json_output_is_treated_as_empty_summary() {
        let (analyzer, log, _state, _handle) = harness("not json at all");
        push_passive(&log, 3);
        let len_before = log.len();
        analyzer.tick(0).await;
        assert_eq!(log.len(), len_before);
    }
}
