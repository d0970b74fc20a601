//! Turn-taking core: the four components spec §4.1-4.4 describe as the
//! bot's always-on listening/speaking machinery.
//!
//! - State Controller: the five-state bot lifecycle (`state_controller`)
//! - Speech Gate: silence tracking so the bot never talks over a human
//!   (`speech_gate`)
//! - Transcription Router: the six-step transcript routing rule, PTT
//!   buffering, and the race-free PTT-release handoff (`router`)
//! - Response Gate: suppresses auto-triggered LLM turns until a hand is
//!   approved (`response_gate`)

pub mod response_gate;
pub mod router;
pub mod speech_gate;
pub mod state_controller;

pub use response_gate::{AutoTrigger, ResponseGate};
pub use router::{PttTurn, Router};
pub use speech_gate::SpeechGate;
pub use state_controller::StateController;
