//! Speech Gate: tracks silence so the bot never talks over a human (spec
//! §4.2). `parking_lot::Mutex`-guarded, the teacher's synchronous-hot-state
//! idiom (`InterruptHandler`'s `Mutex<HandlerState>`).
//!
//! Two clock sources feed it: VAD speaking-started/stopped events
//! (preferred) and transcript arrivals (fallback). When `vad_available` is
//! false the gate degrades to transcript-only timing, per the spec's
//! graceful-degradation note — correctness never depends on VAD being
//! present, only responsiveness does.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct GateState {
    last_human_speech_at: Instant,
    human_speaking: bool,
}

pub struct SpeechGate {
    state: Mutex<GateState>,
    min_silence: Duration,
    vad_available: Mutex<bool>,
}

impl SpeechGate {
    pub fn new(min_silence: Duration) -> Self {
        Self {
            state: Mutex::new(GateState {
                last_human_speech_at: Instant::now(),
                human_speaking: false,
            }),
            min_silence,
            vad_available: Mutex::new(true),
        }
    }

    pub fn set_vad_available(&self, available: bool) {
        *self.vad_available.lock() = available;
    }

    pub fn vad_available(&self) -> bool {
        *self.vad_available.lock()
    }

    /// VAD speaking-started/stopped event. Ignored while VAD is marked
    /// unavailable so a stale event stream can't reintroduce a clock source
    /// the caller has explicitly disabled.
    pub fn on_vad_event(&self, speaking: bool) {
        if !self.vad_available() {
            return;
        }
        let mut state = self.state.lock();
        state.human_speaking = speaking;
        if speaking {
            state.last_human_speech_at = Instant::now();
        }
    }

    /// A transcript (interim or final) arrived for some human participant.
    /// Always restarts the silence timer, regardless of VAD availability —
    /// it is both the preferred fallback clock and corroborating evidence
    /// when VAD is present.
    pub fn on_transcript_arrival(&self) {
        let mut state = self.state.lock();
        state.last_human_speech_at = Instant::now();
        if !self.vad_available() {
            state.human_speaking = false;
        }
    }

    pub fn silence_ms(&self) -> u64 {
        self.state.lock().last_human_speech_at.elapsed().as_millis() as u64
    }

    /// True iff silence has held for at least `min_silence_ms` and no human
    /// is currently marked as speaking.
    pub fn can_bot_speak(&self) -> bool {
        let state = self.state.lock();
        !state.human_speaking && state.last_human_speech_at.elapsed() >= self.min_silence
    }
}

impl Default for SpeechGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn blocks_speech_while_human_speaking() {
        let gate = SpeechGate::new(Duration::from_millis(10));
        gate.on_vad_event(true);
        assert!(!gate.can_bot_speak());
    }

    #[test]
    fn allows_speech_after_silence_elapses() {
        let gate = SpeechGate::new(Duration::from_millis(5));
        gate.on_vad_event(true);
        gate.on_vad_event(false);
        sleep(Duration::from_millis(15));
        assert!(gate.can_bot_speak());
    }

    #[test]
    fn transcript_arrival_restarts_timer_when_vad_unavailable() {
        let gate = SpeechGate::new(Duration::from_millis(20));
        gate.set_vad_available(false);
        gate.on_transcript_arrival();
        assert!(!gate.can_bot_speak());
        sleep(Duration::from_millis(30));
        assert!(gate.can_bot_speak());
    }

    #[test]
    fn vad_events_ignored_once_marked_unavailable() {
        let gate = SpeechGate::new(Duration::from_millis(5));
        gate.set_vad_available(false);
        gate.on_vad_event(true);
        sleep(Duration::from_millis(10));
        assert!(gate.can_bot_speak());
    }
}
