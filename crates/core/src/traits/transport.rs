//! Transport Adapter interface (spec §4, component 1).
//!
//! The SFU itself is out of scope; this trait is the seam the rest of the
//! workspace programs against so `crates/transport` can ship an in-process
//! test double without any real media plumbing.

use async_trait::async_trait;
use crate::app_message::{InboundEnvelope, OutboundAppMessage};
use crate::audio::AudioFrame;
use crate::participant::ParticipantId;
use crate::Result;

/// Participant-lifecycle and speech-activity events the transport surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    ParticipantJoined { id: ParticipantId, display_name: String },
    ParticipantLeft { id: ParticipantId },
    SpeakingStarted { id: ParticipantId },
    SpeakingStopped { id: ParticipantId },
}

/// Bidirectional bridge to the call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The bot's own participant id, if the SFU supplies one authoritatively.
    /// Preferred over the name-heuristic fallback in the Participant Registry.
    fn bot_id(&self) -> Option<ParticipantId>;

    async fn send_app_message(&self, message: OutboundAppMessage) -> Result<()>;

    async fn send_audio(&self, frame: AudioFrame) -> Result<()>;

    /// Cancel any in-flight outbound audio (interrupt rule, spec §4.1).
    async fn cancel_audio(&self) -> Result<()>;

    /// Next inbound per-participant audio frame, feeding the Speech Gate and
    /// STT. `None` once the channel is closed.
    async fn recv_audio(&self) -> Option<AudioFrame>;

    /// Next inbound app-message, or `None` once the channel is closed.
    async fn recv_app_message(&self) -> Option<InboundEnvelope>;

    /// Next lifecycle event, or `None` once the channel is closed.
    async fn recv_lifecycle(&self) -> Option<LifecycleEvent>;
}
