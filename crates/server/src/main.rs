//! `consultation-copilot` binary entry point: process bootstrap, the only
//! place this workspace uses `anyhow` rather than a `thiserror` enum
//! (teacher idiom — see `server`'s dependencies).

use std::sync::Arc;

use anyhow::Context;
use copilot_server::http::{create_router, AppState};
use copilot_server::{ServerSettings, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let server_settings = Arc::new(ServerSettings::from_env());

    let sessions = Arc::new(SessionManager::new(
        server_settings.max_sessions,
        server_settings.session_timeout,
        server_settings.cleanup_interval,
        server_settings.persist_dir.clone(),
    ));
    let _cleanup_shutdown = sessions.start_cleanup_task();

    let state = AppState {
        sessions,
        server_settings: server_settings.clone(),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&server_settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", server_settings.bind_addr))?;
    tracing::info!(addr = %server_settings.bind_addr, "consultation-copilot listening");

    axum::serve(listener, app).await.context("server loop failed")?;
    Ok(())
}
