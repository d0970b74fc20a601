//! HTTP endpoints: health/readiness checks and the WebSocket upgrade that
//! starts a session, mirroring the teacher's router and CORS-layer-building
//! pattern (`crates/server/src/http.rs`) minus the gold-loan-domain REST
//! surface (chat/tools/session-CRUD), which has no counterpart here.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use copilot_agent::{SessionBackends, SessionContext};
use copilot_config::Settings;
use copilot_core::ParticipantId;
use copilot_transport::{EchoStt, EchoTts};

use crate::session::SessionManager;
use crate::ws_transport::WsTransport;
use crate::ServerSettings;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub server_settings: Arc<ServerSettings>,
}

pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.server_settings.cors_origins, state.server_settings.cors_enabled);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/ws/:call_id", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build a CORS layer from configured origins, grounded on the teacher's
/// `build_cors_layer`: disabled means permissive (dev only), empty origins
/// fall back to `localhost:3000`, otherwise the configured list is used.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (not for production)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        vec!["http://localhost:3000".parse().unwrap()]
    } else {
        origins
            .iter()
            .filter_map(|origin| {
                origin.parse::<HeaderValue>().ok().or_else(|| {
                    tracing::warn!("invalid CORS origin: {origin}");
                    None
                })
            })
            .collect()
    };

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "sessions": state.sessions.count(),
    }))
}

/// Upgrade to a WebSocket and spin up a brand-new session bridged through
/// `WsTransport`. `call_id` seeds `Settings::call_id`; every other session
/// tunable uses its default until a richer bootstrap surface exists.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let bot_id = Some(ParticipantId::new("bot"));
        let transport = Arc::new(WsTransport::spawn(socket, bot_id));

        let mut settings = Settings::from_env();
        settings.call_id = call_id;

        let (ptt_llm, passive_llm) = match (build_llm(&settings, &settings.ptt_model), build_llm(&settings, &settings.passive_model)) {
            (Ok(ptt), Ok(passive)) => (ptt, passive),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("failed to build LLM backend: {e}");
                return;
            }
        };

        let backends = SessionBackends {
            transport: transport.clone(),
            stt: Arc::new(EchoStt),
            tts: Arc::new(EchoTts),
            ptt_llm,
            passive_llm,
        };

        let ctx = SessionContext::spawn(settings, backends);
        match state.sessions.create(ctx) {
            Ok(session) => {
                tracing::info!(session_id = %session.id, "session bridged over websocket");
                // The session's own pumps (spawned inside `SessionContext`)
                // are the only consumers of `transport`'s inbound queues;
                // this task just waits for the socket to die and cleans up.
                transport.wait_closed().await;
                state.sessions.remove(&session.id).await;
            }
            Err(e) => tracing::warn!("failed to register session: {e}"),
        }
    })
}

fn build_llm(settings: &Settings, model: &str) -> Result<Arc<dyn copilot_core::LanguageModel>, copilot_llm::LlmError> {
    let backend = copilot_llm::HttpLlmBackend::new(copilot_llm::HttpLlmConfig {
        model: model.to_string(),
        endpoint: settings.llm_endpoint.clone(),
        api_key: settings.llm_api_key.clone(),
        timeout: std::time::Duration::from_secs(settings.llm_timeout_s),
        ..Default::default()
    })?;
    Ok(Arc::new(backend))
}
