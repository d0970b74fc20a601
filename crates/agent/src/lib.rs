//! Session-level orchestration: the PTT Responder, Passive Analyzer, and
//! Hand-Raise protocol, wired together per session by `SessionContext`.

pub mod hand_raise;
pub mod passive_analyzer;
pub mod ptt_responder;
pub mod session_context;

pub use hand_raise::HandRaise;
pub use passive_analyzer::PassiveAnalyzer;
pub use ptt_responder::PttResponder;
pub use session_context::{SessionBackends, SessionContext};
