//! Crate-wide error type shared by every component.

use thiserror::Error;

/// Errors surfaced across the turn-taking core.
///
/// Nothing in this workspace panics on a bad external input; this type exists
/// for the handful of cases where a caller genuinely needs to distinguish
/// failure kinds (session setup, serialization of persisted state). Hot-path
/// rejections (invalid app-message, out-of-order state event) are not errors
/// at all — they are logged and dropped, per the error handling design.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("persistence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
