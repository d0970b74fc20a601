//! Trivial `SpeechToText`/`TextToSpeech` adapters.
//!
//! Real STT/TTS vendor clients are a thin-adapter seam deliberately out of
//! scope (spec §1); these exist so a session can run end-to-end without one
//! wired in, and so integration tests have something other than a
//! `#[cfg(test)]`-local mock to construct.

use async_trait::async_trait;
use chrono::Utc;
use copilot_core::audio::{AudioFrame, Channels, SampleRate};
use copilot_core::participant::ParticipantId;
use copilot_core::traits::{SpeechToText, TextToSpeech, TranscriptionFrame};
use copilot_core::Result;

/// Treats inbound PCM as already-transcribed UTF-8 text. Stands in for a
/// real ASR client until one is wired into a deployment.
pub struct EchoStt;

#[async_trait]
impl SpeechToText for EchoStt {
    async fn transcribe(&self, audio: &AudioFrame) -> Result<TranscriptionFrame> {
        Ok(TranscriptionFrame {
            speaker_id: ParticipantId::new(audio.participant_id.clone().unwrap_or_default()),
            text: String::from_utf8_lossy(&audio.pcm).to_string(),
            timestamp: Utc::now(),
        })
    }

    fn model_name(&self) -> &str {
        "echo-stt"
    }
}

/// Emits the message text as its own PCM payload rather than synthesized
/// audio. Stands in for a real TTS client until one is wired into a
/// deployment; sufficient for exercising the framed-emission and
/// interrupt-cancellation paths without a vendor dependency.
pub struct EchoTts;

#[async_trait]
impl TextToSpeech for EchoTts {
    async fn synthesize(&self, text: &str) -> Result<AudioFrame> {
        Ok(AudioFrame::new(
            SampleRate::Hz16000,
            Channels::Mono,
            text.as_bytes().to_vec(),
        ))
    }

    fn model_name(&self) -> &str {
        "echo-tts"
    }
}
