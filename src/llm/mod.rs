//! LLM — hosted chat-completion provider adapter.
//!
//! DESIGN
//! ======
//! Uses environment variables instead of config files. `LlmClient` wraps the
//! OpenAI-compatible client (OpenRouter by default) and remembers which model
//! serves each tier. Everything above this module talks to the
//! [`LlmChat`] trait so tests can swap in a scripted mock.

pub mod config;
pub mod openai;
pub mod sse;
pub mod types;

use config::LlmConfig;
pub use types::LlmChat;
use types::{ChatRequest, LlmError, TextStream, TierModels};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete LLM client configured by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: openai::OpenAiClient,
    models: TierModels,
}

impl LlmClient {
    /// Build an LLM client from environment variables. See [`LlmConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let inner = openai::OpenAiClient::new(config)?;
        Ok(Self { inner, models: config.models.clone() })
    }

    /// Tier-to-model mapping this client was configured with.
    #[must_use]
    pub fn models(&self) -> &TierModels {
        &self.models
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.inner.complete(request).await
    }

    async fn stream(&self, request: &ChatRequest) -> Result<TextStream, LlmError> {
        self.inner.stream(request).await
    }
}
