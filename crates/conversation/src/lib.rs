//! Conversation Log and Participant Registry (spec §4, components 4 and 9),
//! plus shutdown persistence (spec §6 Persisted state).

pub mod log;
pub mod persistence;
pub mod registry;

pub use log::ConversationLog;
pub use registry::Registry;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversationLogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
