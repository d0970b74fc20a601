//! Minimal audio type needed only for `SpeechToText`/`TextToSpeech` signatures.
//!
//! This workspace does not process audio samples itself (the SFU transport
//! and the STT/TTS services are thin external collaborators per spec), so
//! this is an envelope, not a codec.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRate {
    Hz8000,
    Hz16000,
    Hz48000,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    Mono,
    Stereo,
}

/// Raw PCM payload plus enough metadata for an adapter to do its job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrame {
    pub participant_id: Option<String>,
    pub sample_rate: SampleRate,
    pub channels: Channels,
    pub pcm: Vec<u8>,
}

impl AudioFrame {
    pub fn new(sample_rate: SampleRate, channels: Channels, pcm: Vec<u8>) -> Self {
        Self {
            participant_id: None,
            sample_rate,
            channels,
            pcm,
        }
    }
}
