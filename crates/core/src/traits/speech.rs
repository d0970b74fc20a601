//! Speech processing traits.
//!
//! Pared down from a streaming, multi-language design to the single-shot
//! shape this system actually needs: STT and TTS are thin adapters (spec
//! §1 Non-goals), not full pipeline stages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::AudioFrame;
use crate::participant::ParticipantId;
use crate::Result;

/// One finalized STT result (spec §6 service contracts). Interim results are
/// disabled upstream; only `final: true` frames reach this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionFrame {
    pub speaker_id: ParticipantId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Speech-to-text adapter.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    async fn transcribe(&self, audio: &AudioFrame) -> Result<TranscriptionFrame>;

    fn model_name(&self) -> &str;
}

/// Text-to-speech adapter. `synthesize` is called once per framed response
/// (spec §4.7) with the full approved message, never per-sentence.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    async fn synthesize(&self, text: &str) -> Result<AudioFrame>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStt;

    #[async_trait]
    impl SpeechToText for MockStt {
        async fn transcribe(&self, _audio: &AudioFrame) -> Result<TranscriptionFrame> {
            Ok(TranscriptionFrame {
                speaker_id: ParticipantId::new("p1"),
                text: "test transcription".to_string(),
                timestamp: Utc::now(),
            })
        }

        fn model_name(&self) -> &str {
            "mock-stt"
        }
    }

    #[tokio::test]
    async fn mock_stt_transcribes() {
        let stt = MockStt;
        let audio = AudioFrame::new(
            crate::audio::SampleRate::Hz16000,
            crate::audio::Channels::Mono,
            vec![],
        );
        let frame = stt.transcribe(&audio).await.unwrap();
        assert_eq!(frame.text, "test transcription");
    }
}
