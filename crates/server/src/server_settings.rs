//! Process-level server configuration, separate from the per-session
//! `copilot_config::Settings` (listing/call/turn-taking tunables): bind
//! address, session capacity, and CORS origins. Loaded with the same
//! `env_or`-per-field idiom as `copilot_config::Settings::from_env`.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub cors_enabled: bool,
    pub max_sessions: usize,
    pub session_timeout: Duration,
    pub cleanup_interval: Duration,
    /// Directory shutdown persistence writes the transcript/context files
    /// into (spec §6 Persisted state).
    pub persist_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            cors_origins: Vec::new(),
            cors_enabled: true,
            max_sessions: 64,
            session_timeout: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
            persist_dir: "./call-records".to_string(),
        }
    }
}

impl ServerSettings {
    /// Load from the process environment (`BIND_ADDR`, `CORS_ORIGINS`
    /// comma-separated, `CORS_ENABLED`, `MAX_SESSIONS`,
    /// `SESSION_TIMEOUT_SECS`, `CLEANUP_INTERVAL_SECS`, `PERSIST_DIR`),
    /// falling back to defaults for anything absent.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_origins: std::env::var("CORS_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.cors_origins),
            cors_enabled: std::env::var("CORS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cors_enabled),
            max_sessions: std::env::var("MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_sessions),
            session_timeout: std::env::var("SESSION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_timeout),
            cleanup_interval: std::env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            persist_dir: std::env::var("PERSIST_DIR").unwrap_or(defaults.persist_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = ServerSettings::default();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert!(settings.cors_origins.is_empty());
        assert_eq!(settings.max_sessions, 64);
    }
}
