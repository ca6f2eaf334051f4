//! LLM configuration parsed from environment variables.

use super::types::{LlmError, TierModels};

pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_TITLE: &str = "Swipe Cards";
pub const DEFAULT_FAST_MODEL: &str = "mistralai/ministral-3b";
pub const DEFAULT_SLOW_MODEL: &str = "x-ai/grok-4";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    /// Sent as `HTTP-Referer` so the provider can attribute traffic.
    pub app_url: String,
    /// Sent as `X-Title`.
    pub app_title: String,
    pub models: TierModels,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `LLM_API_KEY_ENV`: names the env var containing the key (default `OPENROUTER_API_KEY`)
    /// - `LLM_BASE_URL`: default `https://openrouter.ai/api/v1`
    /// - `LLM_APP_URL`, `LLM_APP_TITLE`: attribution headers
    /// - `LLM_FAST_MODEL`, `LLM_SLOW_MODEL`: tier models
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the key variable is unset or a model name is blank.
    pub fn from_env() -> Result<Self, LlmError> {
        let key_var = std::env::var("LLM_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&key_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: key_var.clone() })?;

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let app_url = std::env::var("LLM_APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.to_string());
        let app_title = std::env::var("LLM_APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string());

        let models = TierModels {
            fast: parse_model("LLM_FAST_MODEL", std::env::var("LLM_FAST_MODEL").ok(), DEFAULT_FAST_MODEL)?,
            slow: parse_model("LLM_SLOW_MODEL", std::env::var("LLM_SLOW_MODEL").ok(), DEFAULT_SLOW_MODEL)?,
        };
        let timeouts = LlmTimeouts {
            request_secs: env_parse_u64("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key, base_url, app_url, app_title, models, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_model(key: &str, raw: Option<String>, default: &str) -> Result<String, LlmError> {
    match raw {
        None => Ok(default.to_string()),
        Some(name) if name.trim().is_empty() => Err(LlmError::ConfigParse(format!("{key} is set but empty"))),
        Some(name) => Ok(name.trim().to_string()),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
