//! `Transport` implementation bridging one `axum` WebSocket connection to a
//! `SessionContext`.
//!
//! The real SFU and its per-participant audio fan-out are out of scope
//! (spec §1): this type treats the single socket as the whole data channel,
//! carrying every inbound event a real SFU would otherwise deliver as
//! distinct callbacks (app-messages, lifecycle events) as tagged JSON text
//! frames, and inbound caller audio as binary frames from one designated
//! `caller` participant. Grounded on `crates/transport::ChannelTransport`'s
//! channel-per-direction shape, with the wire (de)serialization this
//! in-process double doesn't need.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};

use copilot_core::app_message::{InboundAppMessage, InboundEnvelope, OutboundAppMessage};
use copilot_core::audio::{AudioFrame, Channels, SampleRate};
use copilot_core::participant::ParticipantId;
use copilot_core::traits::{LifecycleEvent, Transport};
use copilot_core::Result;

/// The single non-bot participant a `WsTransport` attributes inbound audio
/// to, absent a real SFU's per-track participant tagging.
const CALLER_ID: &str = "caller";

#[derive(serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireInbound {
    AppMessage { sender_id: String, message: InboundAppMessage },
    ParticipantJoined { id: String, display_name: String },
    ParticipantLeft { id: String },
    SpeakingStarted { id: String },
    SpeakingStopped { id: String },
}

pub struct WsTransport {
    bot_id: Option<ParticipantId>,
    outbound_tx: mpsc::UnboundedSender<Message>,
    audio_rx: Mutex<mpsc::UnboundedReceiver<AudioFrame>>,
    app_rx: Mutex<mpsc::UnboundedReceiver<InboundEnvelope>>,
    lifecycle_rx: Mutex<mpsc::UnboundedReceiver<LifecycleEvent>>,
    audio_cancelled: std::sync::atomic::AtomicUsize,
    /// Fires once the reader task's loop exits (socket closed or errored),
    /// so callers outside the `Transport` trait's pull-based consumers can
    /// still notice the connection died without racing them for messages.
    closed: std::sync::Arc<tokio::sync::Notify>,
}

impl WsTransport {
    /// Split `socket` and spawn the reader/writer pump tasks. `bot_id` is
    /// the participant id this session's own synthesized audio and state
    /// broadcasts are attributed to.
    pub fn spawn(socket: WebSocket, bot_id: Option<ParticipantId>) -> Self {
        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let closed = std::sync::Arc::new(tokio::sync::Notify::new());
        let reader_closed = closed.clone();

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(Ok(message)) = stream.next().await {
                match message {
                    Message::Text(text) => match serde_json::from_str::<WireInbound>(&text) {
                        Ok(WireInbound::AppMessage { sender_id, message }) => {
                            let _ = app_tx.send(InboundEnvelope {
                                sender_id: ParticipantId::new(sender_id),
                                message,
                            });
                        }
                        Ok(WireInbound::ParticipantJoined { id, display_name }) => {
                            let _ = lifecycle_tx.send(LifecycleEvent::ParticipantJoined {
                                id: ParticipantId::new(id),
                                display_name,
                            });
                        }
                        Ok(WireInbound::ParticipantLeft { id }) => {
                            let _ = lifecycle_tx.send(LifecycleEvent::ParticipantLeft { id: ParticipantId::new(id) });
                        }
                        Ok(WireInbound::SpeakingStarted { id }) => {
                            let _ = lifecycle_tx.send(LifecycleEvent::SpeakingStarted { id: ParticipantId::new(id) });
                        }
                        Ok(WireInbound::SpeakingStopped { id }) => {
                            let _ = lifecycle_tx.send(LifecycleEvent::SpeakingStopped { id: ParticipantId::new(id) });
                        }
                        Err(e) => tracing::debug!("dropping malformed inbound frame: {e}"),
                    },
                    Message::Binary(pcm) => {
                        let mut frame = AudioFrame::new(SampleRate::Hz16000, Channels::Mono, pcm);
                        frame.participant_id = Some(CALLER_ID.to_string());
                        let _ = audio_tx.send(frame);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            // `notify_one`, not `notify_waiters`: stores a permit so a
            // `wait_closed` call arriving after this point still resolves
            // immediately instead of hanging.
            reader_closed.notify_one();
        });

        Self {
            bot_id,
            outbound_tx,
            audio_rx: Mutex::new(audio_rx),
            app_rx: Mutex::new(app_rx),
            lifecycle_rx: Mutex::new(lifecycle_rx),
            audio_cancelled: std::sync::atomic::AtomicUsize::new(0),
            closed,
        }
    }

    /// Resolves once the connection has closed (reader task exited).
    pub async fn wait_closed(&self) {
        self.closed.notified().await;
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn bot_id(&self) -> Option<ParticipantId> {
        self.bot_id.clone()
    }

    async fn send_app_message(&self, message: OutboundAppMessage) -> Result<()> {
        let text = serde_json::to_string(&message)
            .map_err(|e| copilot_core::Error::Transport(format!("encode outbound app message: {e}")))?;
        self.outbound_tx
            .send(Message::Text(text))
            .map_err(|_| copilot_core::Error::Transport("websocket closed".to_string()))
    }

    async fn send_audio(&self, frame: AudioFrame) -> Result<()> {
        self.outbound_tx
            .send(Message::Binary(frame.pcm))
            .map_err(|_| copilot_core::Error::Transport("websocket closed".to_string()))
    }

    async fn cancel_audio(&self) -> Result<()> {
        self.audio_cancelled.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        // Not part of the spec's outbound app-message set; a lightweight
        // client-side signal to stop playing whatever audio is already
        // buffered, distinct from the ResponseEnd framing marker.
        let control = serde_json::json!({"type": "cancel_audio"}).to_string();
        self.outbound_tx
            .send(Message::Text(control))
            .map_err(|_| copilot_core::Error::Transport("websocket closed".to_string()))
    }

    async fn recv_audio(&self) -> Option<AudioFrame> {
        self.audio_rx.lock().await.recv().await
    }

    async fn recv_app_message(&self) -> Option<InboundEnvelope> {
        self.app_rx.lock().await.recv().await
    }

    async fn recv_lifecycle(&self) -> Option<LifecycleEvent> {
        self.lifecycle_rx.lock().await.recv().await
    }
}
