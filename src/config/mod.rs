// src/config/mod.rs
// All tunables load from the environment (optionally via .env), with defaults
// that work against a local backend.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TandemConfig {
    // ── Backend transport
    pub backend_base_url: String,
    /// Opaque bearer token attached to every request. Empty means no header
    /// (auth is handled entirely by the identity provider, not by us).
    pub backend_token: String,
    pub request_timeout_secs: u64,

    // ── Transcript cache
    pub transcript_ttl_secs: u64,

    // ── Query retry (list/history fetches only; 404 is never retried)
    pub list_retries: u32,

    // ── Translation availability polling
    pub translation_poll_attempts: u32,
    pub translation_poll_initial_ms: u64,
    pub translation_poll_backoff: f64,
    pub translation_poll_max_ms: u64,

    // ── Logging
    pub log_level: String,
}

pub static CONFIG: Lazy<TandemConfig> = Lazy::new(TandemConfig::from_env);

/// Parse an env var, falling back to the default when missing or malformed.
/// Values may carry trailing comments or whitespace from .env files.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl TandemConfig {
    pub fn from_env() -> Self {
        // Load .env first if present; plain env vars win otherwise.
        let _ = dotenvy::dotenv();

        Self {
            backend_base_url: env_var_or(
                "TANDEM_BACKEND_URL",
                "http://localhost:8080/api".to_string(),
            ),
            backend_token: env_var_or("TANDEM_BACKEND_TOKEN", String::new()),
            request_timeout_secs: env_var_or("TANDEM_REQUEST_TIMEOUT", 30),
            transcript_ttl_secs: env_var_or("TANDEM_TRANSCRIPT_TTL", 60),
            list_retries: env_var_or("TANDEM_LIST_RETRIES", 2),
            translation_poll_attempts: env_var_or("TANDEM_TRANSLATION_POLL_ATTEMPTS", 5),
            translation_poll_initial_ms: env_var_or("TANDEM_TRANSLATION_POLL_INITIAL_MS", 1000),
            translation_poll_backoff: env_var_or("TANDEM_TRANSLATION_POLL_BACKOFF", 1.5),
            translation_poll_max_ms: env_var_or("TANDEM_TRANSLATION_POLL_MAX_MS", 8000),
            log_level: env_var_or("TANDEM_LOG_LEVEL", "info".to_string()),
        }
    }

    pub fn transcript_ttl(&self) -> Duration {
        Duration::from_secs(self.transcript_ttl_secs)
    }

    pub fn token(&self) -> Option<&str> {
        if self.backend_token.is_empty() {
            None
        } else {
            Some(&self.backend_token)
        }
    }
}
