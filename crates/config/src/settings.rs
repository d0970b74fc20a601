//! Session settings loaded from environment variables (spec §6 Configuration).

use serde::{Deserialize, Serialize};

/// Consultation context and turn-taking tunables for one session.
///
/// Every field has a `#[serde(default = "...")]` paired with a standalone
/// default function, and `Default` calls those same functions rather than
/// `..Default::default()` — matching the teacher's `AgentConfig`/
/// `PersonaConfig` pattern (`crates/config/src/agent.rs`) so the defaults
/// live in exactly one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_buyer_name")]
    pub buyer_name: String,

    #[serde(default = "default_seller_name")]
    pub seller_name: String,

    #[serde(default = "default_target_name")]
    pub target_name: String,

    #[serde(default = "default_listing_title")]
    pub listing_title: String,

    #[serde(default = "default_call_id")]
    pub call_id: String,

    #[serde(default = "default_call_duration_mins")]
    pub call_duration_mins: u32,

    /// Buyer's tracked questions, from `QUESTION_1`..`QUESTION_5`.
    #[serde(default)]
    pub questions: Vec<String>,

    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u64,

    #[serde(default = "default_passive_analyzer_interval_s")]
    pub passive_analyzer_interval_s: u64,

    #[serde(default = "default_ptt_latch_grace_s")]
    pub ptt_latch_grace_s: u64,

    #[serde(default = "default_llm_timeout_s")]
    pub llm_timeout_s: u64,

    /// LLM backend credential. Never derives `Debug`-visible logging of its
    /// value; kept `Option<String>` and only the presence is ever logged,
    /// matching the teacher's `LlmConfig::api_key` handling.
    #[serde(default)]
    pub llm_api_key: Option<String>,

    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,

    #[serde(default = "default_ptt_model")]
    pub ptt_model: String,

    #[serde(default = "default_passive_model")]
    pub passive_model: String,
}

fn default_buyer_name() -> String {
    "the buyer".to_string()
}
fn default_seller_name() -> String {
    "the seller".to_string()
}
fn default_target_name() -> String {
    "the contact".to_string()
}
fn default_listing_title() -> String {
    "network connection".to_string()
}
fn default_call_id() -> String {
    "unknown".to_string()
}
fn default_call_duration_mins() -> u32 {
    30
}
fn default_min_silence_ms() -> u64 {
    2000
}
fn default_passive_analyzer_interval_s() -> u64 {
    15
}
fn default_ptt_latch_grace_s() -> u64 {
    5
}
fn default_llm_timeout_s() -> u64 {
    30
}
fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_ptt_model() -> String {
    "gpt-4o".to_string()
}
fn default_passive_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            buyer_name: default_buyer_name(),
            seller_name: default_seller_name(),
            target_name: default_target_name(),
            listing_title: default_listing_title(),
            call_id: default_call_id(),
            call_duration_mins: default_call_duration_mins(),
            questions: Vec::new(),
            min_silence_ms: default_min_silence_ms(),
            passive_analyzer_interval_s: default_passive_analyzer_interval_s(),
            ptt_latch_grace_s: default_ptt_latch_grace_s(),
            llm_timeout_s: default_llm_timeout_s(),
            llm_api_key: None,
            llm_endpoint: default_llm_endpoint(),
            ptt_model: default_ptt_model(),
            passive_model: default_passive_model(),
        }
    }
}

impl Settings {
    /// Load from the process environment, falling back to defaults for any
    /// variable that is absent (`BUYER_NAME`, `SELLER_NAME`, `TARGET_NAME`,
    /// `LISTING_TITLE`, `CALL_ID`, `CALL_DURATION_MINS`, `QUESTION_1..5`,
    /// plus the turn-taking tunables and LLM connection fields).
    pub fn from_env() -> Self {
        let mut settings = Self {
            buyer_name: env_or("BUYER_NAME", default_buyer_name()),
            seller_name: env_or("SELLER_NAME", default_seller_name()),
            target_name: env_or("TARGET_NAME", default_target_name()),
            listing_title: env_or("LISTING_TITLE", default_listing_title()),
            call_id: env_or("CALL_ID", default_call_id()),
            call_duration_mins: std::env::var("CALL_DURATION_MINS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_call_duration_mins),
            llm_api_key: std::env::var("OPENAI_API_KEY").ok(),
            llm_endpoint: env_or("LLM_ENDPOINT", default_llm_endpoint()),
            ..Self::default()
        };

        settings.questions = (1..=5)
            .filter_map(|i| std::env::var(format!("QUESTION_{i}")).ok())
            .filter(|q| !q.is_empty())
            .collect();

        settings
    }
}

fn env_or(key: &str, fallback: String) -> String {
    std::env::var(key).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_fallbacks() {
        let settings = Settings::default();
        assert_eq!(settings.buyer_name, "the buyer");
        assert_eq!(settings.min_silence_ms, 2000);
        assert_eq!(settings.passive_analyzer_interval_s, 15);
        assert!(settings.questions.is_empty());
    }

    #[test]
    fn from_env_reads_question_vars() {
        std::env::set_var("QUESTION_1", "What is the rate?");
        std::env::set_var("QUESTION_3", "When does it close?");
        std::env::remove_var("QUESTION_2");
        std::env::remove_var("QUESTION_4");
        std::env::remove_var("QUESTION_5");

        let settings = Settings::from_env();
        assert_eq!(settings.questions, vec!["What is the rate?", "When does it close?"]);

        std::env::remove_var("QUESTION_1");
        std::env::remove_var("QUESTION_3");
    }
}
