//! Session management: a `SessionContext` keyed by id, with capacity limits
//! and a periodic expiry sweep.
//!
//! Grounded on the teacher's `Session`/`SessionManager`
//! (`crates/server/src/session.rs`): `parking_lot::RwLock<HashMap<...>>`
//! registry, `start_cleanup_task` returning a `watch::Sender<bool>` shutdown
//! handle. The teacher's `SessionStore`/Redis/ScyllaDB persistence-backend
//! abstraction is dropped entirely (see DESIGN.md) — this system's only
//! persistence is the shutdown transcript/context dump (spec §6), not a
//! distributed session store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::watch;

use copilot_agent::SessionContext;
use copilot_conversation::persistence;

use crate::ServerError;

/// One active call: the session context plus bookkeeping the manager needs
/// that doesn't belong inside `SessionContext` itself.
pub struct Session {
    pub id: String,
    pub ctx: Arc<SessionContext>,
    created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    fn new(id: String, ctx: SessionContext) -> Self {
        Self {
            id,
            ctx: Arc::new(ctx),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
    persist_dir: String,
}

impl SessionManager {
    pub fn new(max_sessions: usize, session_timeout: Duration, cleanup_interval: Duration, persist_dir: String) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
            persist_dir,
        }
    }

    /// Register an already-built `SessionContext` under a fresh id.
    pub fn create(&self, ctx: SessionContext) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            return Err(ServerError::Capacity);
        }
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), ctx));
        sessions.insert(id, session.clone());
        tracing::info!(session_id = %session.id, "session created");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Remove a session, persisting its transcript/context before the
    /// `SessionContext` and its background tasks are torn down (spec §6
    /// Persisted state, grounded on `bot.py`'s shutdown block).
    pub async fn remove(&self, id: &str) {
        let removed = self.sessions.write().remove(id);
        let Some(session) = removed else { return };

        let call_id = session.ctx.settings.call_id.clone();
        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let entries = session.ctx.log.all();
        let participants = session.ctx.registry.all();
        let dir = std::path::PathBuf::from(&self.persist_dir);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(session_id = %id, "failed to create persist dir: {e}");
        } else {
            if let Err(e) = persistence::write_transcript(&dir, &call_id, &timestamp, &entries, &participants) {
                tracing::warn!(session_id = %id, "failed to write transcript: {e}");
            }
            if let Err(e) = persistence::write_context(&dir, &call_id, &timestamp, &entries, &participants) {
                tracing::warn!(session_id = %id, "failed to write context: {e}");
            }
        }

        session.ctx.shutdown().await;
        tracing::info!(session_id = %id, "session removed");
    }

    /// Start the periodic expiry sweep. Mirrors the teacher's
    /// `SessionManager::start_cleanup_task`: a `tokio::time::interval`
    /// raced against a `watch::Receiver<bool>` shutdown signal.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(manager.cleanup_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let expired: Vec<String> = manager
                            .sessions
                            .read()
                            .iter()
                            .filter(|(_, s)| s.is_expired(manager.session_timeout))
                            .map(|(id, _)| id.clone())
                            .collect();
                        for id in expired {
                            manager.remove(&id).await;
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use copilot_agent::SessionBackends;
    use copilot_config::Settings;
    use copilot_core::{AudioFrame, GenerateRequest, LanguageModel, Result, TextToSpeech};
    use copilot_transport::{ChannelTransport, EchoStt};

    struct NoopTts;
    #[async_trait]
    impl TextToSpeech for NoopTts {
        async fn synthesize(&self, _text: &str) -> Result<AudioFrame> {
            Ok(AudioFrame::new(
                copilot_core::SampleRate::Hz16000,
                copilot_core::Channels::Mono,
                vec![],
            ))
        }
        fn model_name(&self) -> &str {
            "noop"
        }
    }

    struct StubLlm;
    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            Ok("ok".to_string())
        }
        async fn is_available(&self) -> bool {
            true
        }
        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn build_ctx() -> SessionContext {
        let (transport, _handle) = ChannelTransport::new(None);
        let backends = SessionBackends {
            transport: Arc::new(transport),
            stt: Arc::new(EchoStt),
            tts: Arc::new(NoopTts),
            ptt_llm: Arc::new(StubLlm),
            passive_llm: Arc::new(StubLlm),
        };
        SessionContext::spawn(Settings::default(), backends)
    }

    fn manager() -> SessionManager {
        SessionManager::new(2, Duration::from_secs(3600), Duration::from_secs(300), std::env::temp_dir().to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let manager = manager();
        let session = manager.create(build_ctx()).unwrap();
        let id = session.id.clone();
        assert!(manager.get(&id).is_some());
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let manager = manager();
        manager.create(build_ctx()).unwrap();
        manager.create(build_ctx()).unwrap();
        assert!(matches!(manager.create(build_ctx()), Err(ServerError::Capacity)));
    }

    #[tokio::test]
    async fn remove_persists_and_drops_session() {
        let manager = manager();
        let session = manager.create(build_ctx()).unwrap();
        let id = session.id.clone();
        drop(session);
        manager.remove(&id).await;
        assert!(manager.get(&id).is_none());
    }
}
