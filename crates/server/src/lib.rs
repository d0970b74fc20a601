//! Session management and the external app-message surface (SPEC_FULL.md §2
//! `crates/server`): an in-process `SessionManager`, an `axum` WebSocket
//! endpoint bridging inbound/outbound `AppMessage`s, and the
//! `consultation-copilot` binary's `main.rs`.

pub mod http;
pub mod server_settings;
pub mod session;
pub mod ws_transport;

pub use http::create_router;
pub use server_settings::ServerSettings;
pub use session::{Session, SessionManager};
pub use ws_transport::WsTransport;

use thiserror::Error;

/// Server-level errors (teacher idiom: one `thiserror` enum per crate).
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("max sessions reached")]
    Capacity,

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] copilot_conversation::ConversationLogError),
}

impl From<&ServerError> for axum::http::StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::SessionNotFound(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::Capacity => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::WebSocket(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Persistence(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
