//! LLM completion across a chain of hosted providers.
//!
//! Providers are tried in the configured priority order through a
//! [`FallbackExecutor`]; the first provider that answers wins.
//!
//! # Providers
//!
//! - [`openai`]: OpenAI and the compatible Groq, Mistral and OpenRouter APIs
//! - [`anthropic`]: Anthropic Messages API
//! - [`gemini`]: Google Gemini `generateContent`
//!
//! # JSON mode
//!
//! With [`CompletionOptions::json_mode`] each provider is asked for JSON in
//! its own way. Output that still fails to parse after fences are stripped
//! is sent back through the whole chain with a repair instruction, up to
//! `json_repair_attempts` times, before [`SearchError::MalformedResponse`]
//! is returned.

pub mod anthropic;
pub mod chain;
pub mod gemini;
pub mod json_repair;
pub mod message;
pub mod openai;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use scout_search::{ChainResult, ExecuteOptions, FallbackExecutor, SearchError};

use crate::config::LlmConfig;

pub use chain::build_completion_chain;
pub use message::{Message, Role};
pub use provider::{LlmProvider, ProviderCredentials, ProviderSettings, RequestOptions};

/// Canonical completion result, whichever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text. In JSON mode, the cleaned JSON document.
    pub content: String,
    /// Provider that answered.
    pub provider_label: String,
    /// Model reported by the provider, or the configured one.
    pub model_id: String,
}

/// Options for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Request a JSON document and repair invalid output.
    pub json_mode: bool,
    /// Retries per provider after the first attempt.
    pub max_retries: u32,
    /// Timeout for each attempt.
    pub timeout: Duration,
    /// Base delay between attempts, doubled each retry.
    pub backoff_base: Duration,
    pub cancel: CancellationToken,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            json_mode: false,
            max_retries: 2,
            timeout: Duration::from_secs(60),
            backoff_base: Duration::from_millis(500),
            cancel: CancellationToken::new(),
        }
    }
}

impl CompletionOptions {
    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions::default()
            .with_max_retries(self.max_retries)
            .with_timeout(self.timeout)
            .with_backoff(self.backoff_base, true)
            .with_cancel(self.cancel.clone())
    }
}

/// Runs completions through the configured provider chain.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: Arc<LlmConfig>,
    executor: FallbackExecutor,
}

impl LlmClient {
    /// Create a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config: Arc::new(config),
            executor: FallbackExecutor::new(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generate a completion for `messages`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::ProviderUnavailable`] if no provider has a key.
    /// - [`SearchError::AllProvidersExhausted`] if every provider failed.
    /// - [`SearchError::MalformedResponse`] if JSON mode output could not be
    ///   repaired.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion, SearchError> {
        let providers = self.config.configured_providers();
        if providers.is_empty() {
            return Err(SearchError::ProviderUnavailable(
                "no LLM provider has an API key configured".into(),
            ));
        }

        let request = RequestOptions {
            json_mode: options.json_mode,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut result = self.run_chain(&providers, messages.to_vec(), request, options).await?;
        if !options.json_mode {
            return Ok(result.data);
        }

        let mut repairs = 0;
        loop {
            match json_repair::extract_json(&result.data.content) {
                Ok(clean) => {
                    result.data.content = clean;
                    return Ok(result.data);
                }
                Err(err) if repairs >= self.config.json_repair_attempts => {
                    return Err(SearchError::MalformedResponse(format!(
                        "{}: output is not valid JSON after {repairs} repair attempts: {err}",
                        result.provider_label
                    )));
                }
                Err(err) => {
                    repairs += 1;
                    tracing::warn!(
                        provider = result.provider_label.as_str(),
                        attempt = repairs,
                        error = %err,
                        "invalid JSON from provider, requesting repair"
                    );
                    let conversation =
                        json_repair::repair_messages(messages, &result.data.content, &err.to_string());
                    result = self.run_chain(&providers, conversation, request, options).await?;
                }
            }
        }
    }

    async fn run_chain(
        &self,
        providers: &[ProviderSettings],
        messages: Vec<Message>,
        request: RequestOptions,
        options: &CompletionOptions,
    ) -> Result<ChainResult<Completion>, SearchError> {
        let chain = build_completion_chain(&self.http, providers, Arc::new(messages), request);
        let result = self.executor.execute(&chain, &options.execute_options()).await?;
        tracing::debug!(
            provider = result.provider_label.as_str(),
            model = result.data.model_id.as_str(),
            bytes = result.data.content.len(),
            "completion generated"
        );
        Ok(result)
    }
}

/// Generate a completion with a one-off client for `config`.
///
/// # Errors
///
/// See [`LlmClient::complete`].
pub async fn generate_completion(
    config: &LlmConfig,
    messages: &[Message],
    options: &CompletionOptions,
) -> Result<Completion, SearchError> {
    LlmClient::new(config.clone())?.complete(messages, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_configured_provider_is_unavailable() {
        let err = generate_completion(
            &LlmConfig::default(),
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
    }

    #[test]
    fn options_map_to_execute_options() {
        let options = CompletionOptions {
            max_retries: 4,
            timeout: Duration::from_secs(3),
            ..Default::default()
        }
        .json();
        let exec = options.execute_options();
        assert!(options.json_mode);
        assert_eq!(exec.max_retries, 4);
        assert_eq!(exec.timeout, Duration::from_secs(3));
        assert!(exec.exponential_backoff);
        assert!(!exec.use_cache);
    }
}
