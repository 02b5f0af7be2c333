//! LLM provider identities, resolved settings and shared request plumbing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use scout_search::SearchError;

/// Completion providers that can appear in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
    Mistral,
    OpenRouter,
}

impl LlmProvider {
    /// Every provider, in the default priority order.
    pub const ALL: [LlmProvider; 6] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Groq,
        Self::Mistral,
        Self::OpenRouter,
    ];

    /// Label used in chain results and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::OpenRouter => "openrouter",
        }
    }

    /// API root the request paths are appended to.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Groq => "https://api.groq.com/openai",
            Self::Mistral => "https://api.mistral.ai",
            Self::OpenRouter => "https://openrouter.ai/api",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Mistral => "mistral-small-latest",
            Self::OpenRouter => "openai/gpt-4o-mini",
        }
    }

    /// Environment variable holding the API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Speaks the `/v1/chat/completions` protocol.
    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, Self::Anthropic | Self::Gemini)
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Credentials and endpoint for one provider as written in config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub api_key: Option<String>,
    /// Overrides [`LlmProvider::default_base_url`].
    pub base_url: Option<String>,
    /// Overrides [`LlmProvider::default_model`].
    pub model: Option<String>,
}

/// A provider ready to call: key present, defaults filled in.
#[derive(Clone)]
pub struct ProviderSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ProviderSettings {
    /// Resolve settings, or `None` when no non-blank key is configured.
    pub fn resolve(provider: LlmProvider, credentials: &ProviderCredentials) -> Option<Self> {
        let api_key = credentials
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())?;
        let pick = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Some(Self {
            provider,
            api_key: api_key.to_string(),
            base_url: pick(&credentials.base_url, provider.default_base_url()),
            model: pick(&credentials.model, provider.default_model()),
        })
    }
}

/// Per-request generation options shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOptions {
    /// Ask the provider for a JSON document.
    pub json_mode: bool,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            json_mode: false,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Send a request and decode the JSON body, mapping non-2xx statuses to
/// [`SearchError::Http`] with the provider's own error message.
pub(crate) async fn post_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: LlmProvider,
) -> Result<T, SearchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::debug!(provider = provider.name(), status = status.as_u16(), "provider returned error status");
        return Err(SearchError::http(
            provider.name(),
            status.as_u16(),
            &extract_error_message(&body),
        ));
    }
    tracing::trace!(provider = provider.name(), bytes = body.len(), "completion received");
    scout_search::http::parse_json(&body, provider.name())
}

/// Extract an error message from a provider error body.
///
/// OpenAI-style and Anthropic bodies carry `error.message`; Gemini uses the
/// same field. Anything else is returned as-is.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_key() {
        assert!(ProviderSettings::resolve(LlmProvider::OpenAi, &ProviderCredentials::default()).is_none());
        let blank = ProviderCredentials {
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(ProviderSettings::resolve(LlmProvider::OpenAi, &blank).is_none());
    }

    #[test]
    fn resolve_fills_defaults() {
        let creds = ProviderCredentials {
            api_key: Some("sk-test".into()),
            model: Some("gpt-4o".into()),
            ..Default::default()
        };
        let settings = ProviderSettings::resolve(LlmProvider::OpenAi, &creds).expect("resolved");
        assert_eq!(settings.base_url, "https://api.openai.com");
        assert_eq!(settings.model, "gpt-4o");
    }

    #[test]
    fn debug_hides_key() {
        let creds = ProviderCredentials {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let settings = ProviderSettings::resolve(LlmProvider::Groq, &creds).expect("resolved");
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }

    #[test]
    fn error_message_extraction() {
        let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid API key");
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[test]
    fn compatibility_flags() {
        assert!(LlmProvider::Groq.is_openai_compatible());
        assert!(!LlmProvider::Gemini.is_openai_compatible());
        assert_eq!(LlmProvider::OpenRouter.to_string(), "openrouter");
    }

    #[test]
    fn provider_names_deserialize() {
        let p: LlmProvider = serde_json::from_str("\"openrouter\"").expect("parse");
        assert_eq!(p, LlmProvider::OpenRouter);
        let p: LlmProvider = serde_json::from_str("\"openai\"").expect("parse");
        assert_eq!(p, LlmProvider::OpenAi);
    }
}
