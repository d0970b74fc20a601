//! In-process `Transport` test double.
//!
//! The real SFU client is out of scope (spec §1); this implementation
//! routes everything through `tokio::sync::mpsc`/`broadcast` channels so the
//! test suite and examples can drive a session without any network I/O.
//! Channel-based event routing is grounded on the pack's `AudioRouter`
//! pattern (`continuum`'s `voice/audio_router.rs`, broadcast channel fan-out
//! to heterogeneous participants) adapted to this workspace's pull-based
//! `Transport` trait.

use async_trait::async_trait;
use copilot_core::app_message::{InboundEnvelope, OutboundAppMessage};
use copilot_core::audio::AudioFrame;
use copilot_core::participant::ParticipantId;
use copilot_core::traits::{LifecycleEvent, Transport};
use copilot_core::Result;
use tokio::sync::{mpsc, Mutex};

/// Handle used by test code to drive a `ChannelTransport` from the outside:
/// push inbound messages, lifecycle events, and observe what the session
/// sends out.
pub struct ChannelTransportHandle {
    pub inbound_tx: mpsc::UnboundedSender<InboundEnvelope>,
    pub lifecycle_tx: mpsc::UnboundedSender<LifecycleEvent>,
    pub inbound_audio_tx: mpsc::UnboundedSender<AudioFrame>,
    pub outbound_rx: Mutex<mpsc::UnboundedReceiver<OutboundAppMessage>>,
    pub audio_rx: Mutex<mpsc::UnboundedReceiver<AudioFrame>>,
}

impl ChannelTransportHandle {
    pub async fn next_outbound(&self) -> Option<OutboundAppMessage> {
        self.outbound_rx.lock().await.recv().await
    }

    pub async fn next_audio(&self) -> Option<AudioFrame> {
        self.audio_rx.lock().await.recv().await
    }
}

pub struct ChannelTransport {
    bot_id: Option<ParticipantId>,
    outbound_tx: mpsc::UnboundedSender<OutboundAppMessage>,
    audio_tx: mpsc::UnboundedSender<AudioFrame>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<InboundEnvelope>>,
    lifecycle_rx: Mutex<mpsc::UnboundedReceiver<LifecycleEvent>>,
    inbound_audio_rx: Mutex<mpsc::UnboundedReceiver<AudioFrame>>,
    audio_cancelled: std::sync::atomic::AtomicUsize,
}

impl ChannelTransport {
    pub fn new(bot_id: Option<ParticipantId>) -> (Self, ChannelTransportHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (inbound_audio_tx, inbound_audio_rx) = mpsc::unbounded_channel();

        let transport = Self {
            bot_id,
            outbound_tx,
            audio_tx,
            inbound_rx: Mutex::new(inbound_rx),
            lifecycle_rx: Mutex::new(lifecycle_rx),
            inbound_audio_rx: Mutex::new(inbound_audio_rx),
            audio_cancelled: std::sync::atomic::AtomicUsize::new(0),
        };
        let handle = ChannelTransportHandle {
            inbound_tx,
            lifecycle_tx,
            inbound_audio_tx,
            outbound_rx: Mutex::new(outbound_rx),
            audio_rx: Mutex::new(audio_rx),
        };
        (transport, handle)
    }

    /// Number of times `cancel_audio` has been called, for test assertions
    /// about the interrupt rule (spec §4.1).
    pub fn cancel_count(&self) -> usize {
        self.audio_cancelled.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn bot_id(&self) -> Option<ParticipantId> {
        self.bot_id.clone()
    }

    async fn send_app_message(&self, message: OutboundAppMessage) -> Result<()> {
        self.outbound_tx
            .send(message)
            .map_err(|_| copilot_core::Error::Transport("outbound channel closed".to_string()))
    }

    async fn send_audio(&self, frame: AudioFrame) -> Result<()> {
        self.audio_tx
            .send(frame)
            .map_err(|_| copilot_core::Error::Transport("audio channel closed".to_string()))
    }

    async fn cancel_audio(&self) -> Result<()> {
        self.audio_cancelled.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn recv_audio(&self) -> Option<AudioFrame> {
        self.inbound_audio_rx.lock().await.recv().await
    }

    async fn recv_app_message(&self) -> Option<InboundEnvelope> {
        self.inbound_rx.lock().await.recv().await
    }

    async fn recv_lifecycle(&self) -> Option<LifecycleEvent> {
        self.lifecycle_rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_core::app_message::InboundAppMessage;

    #[tokio::test]
    async fn send_app_message_reaches_handle() {
        let (transport, handle) = ChannelTransport::new(Some(ParticipantId::new("bot")));
        transport
            .send_app_message(OutboundAppMessage::BotHandRaised { reason: "hi".to_string() })
            .await
            .unwrap();
        let received = handle.next_outbound().await.unwrap();
        matches!(received, OutboundAppMessage::BotHandRaised { .. });
    }

    #[tokio::test]
    async fn inbound_message_reaches_transport() {
        let (transport, handle) = ChannelTransport::new(None);
        handle
            .inbound_tx
            .send(InboundEnvelope {
                sender_id: ParticipantId::new("p1"),
                message: InboundAppMessage::Ptt { active: true },
            })
            .unwrap();
        let received = transport.recv_app_message().await.unwrap();
        assert_eq!(received.sender_id, ParticipantId::new("p1"));
    }

    #[tokio::test]
    async fn cancel_audio_increments_counter() {
        let (transport, _handle) = ChannelTransport::new(None);
        transport.cancel_audio().await.unwrap();
        transport.cancel_audio().await.unwrap();
        assert_eq!(transport.cancel_count(), 2);
    }
}
