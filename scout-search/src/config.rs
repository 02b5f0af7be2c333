//! Source configuration with sensible defaults.
//!
//! [`SourceConfig`] controls credentials, endpoint base URLs, HTTP
//! behaviour and web-search provider priority. Every base URL can be
//! overridden so that clients can be pointed at a mock server.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Web-search providers that can appear in a search chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebProvider {
    /// Brave Search API.
    Brave,
    /// Serper (Google results API).
    Serper,
    /// Tavily search API.
    Tavily,
    /// A self-hosted SearXNG instance.
    Searxng,
}

impl WebProvider {
    /// Returns the label used in chain results and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brave => "brave",
            Self::Serper => "serper",
            Self::Tavily => "tavily",
            Self::Searxng => "searxng",
        }
    }
}

/// Configuration for source clients and web-search providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Web-search providers in priority order.
    pub web_priority: Vec<WebProvider>,
    /// Brave Search API key.
    pub brave_api_key: Option<String>,
    /// Serper API key.
    pub serper_api_key: Option<String>,
    /// Tavily API key.
    pub tavily_api_key: Option<String>,
    /// YouTube Data API key.
    pub youtube_api_key: Option<String>,
    /// Stack Exchange application key (raises the anonymous quota).
    pub stackexchange_key: Option<String>,
    /// GitHub token for issue search.
    pub github_token: Option<String>,
    /// Endpoint base URLs.
    pub endpoints: SourceEndpoints,
    /// Transcript service base URL. Transcripts are skipped when unset.
    pub transcript_service_url: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Maximum concurrent liveness checks during content validation.
    pub link_check_concurrency: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            web_priority: vec![
                WebProvider::Brave,
                WebProvider::Serper,
                WebProvider::Tavily,
                WebProvider::Searxng,
            ],
            brave_api_key: None,
            serper_api_key: None,
            tavily_api_key: None,
            youtube_api_key: None,
            stackexchange_key: None,
            github_token: None,
            endpoints: SourceEndpoints::default(),
            transcript_service_url: None,
            http_timeout_secs: 10,
            user_agent: None,
            link_check_concurrency: 8,
        }
    }
}

/// Base URLs of every external API a source client talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub brave: String,
    pub serper: String,
    pub tavily: String,
    /// SearXNG instance. The provider is omitted from the chain when unset.
    pub searxng: Option<String>,
    pub youtube: String,
    pub stackexchange: String,
    pub github: String,
    pub reddit: String,
    pub reddit_html: String,
    pub devto: String,
    pub hackernews: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            brave: "https://api.search.brave.com".into(),
            serper: "https://google.serper.dev".into(),
            tavily: "https://api.tavily.com".into(),
            searxng: None,
            youtube: "https://www.googleapis.com".into(),
            stackexchange: "https://api.stackexchange.com".into(),
            github: "https://api.github.com".into(),
            reddit: "https://www.reddit.com".into(),
            reddit_html: "https://old.reddit.com".into(),
            devto: "https://dev.to".into(),
            hackernews: "https://hn.algolia.com".into(),
        }
    }
}

impl SourceConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.http_timeout_secs == 0 {
            return Err(SearchError::Config(
                "http_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.link_check_concurrency == 0 {
            return Err(SearchError::Config(
                "link_check_concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// API key for a web provider, if configured. SearXNG needs a base URL instead.
    pub fn web_credential(&self, provider: WebProvider) -> Option<&str> {
        match provider {
            WebProvider::Brave => self.brave_api_key.as_deref(),
            WebProvider::Serper => self.serper_api_key.as_deref(),
            WebProvider::Tavily => self.tavily_api_key.as_deref(),
            WebProvider::Searxng => self.endpoints.searxng.as_deref(),
        }
        .filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SourceConfig::default();
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.web_priority.len(), 4);
        assert!(config.user_agent.is_none());
        assert!(config.transcript_service_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SourceConfig {
            http_timeout_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http_timeout_secs"));
    }

    #[test]
    fn zero_link_concurrency_rejected() {
        let config = SourceConfig {
            link_check_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn web_credential_ignores_blank_keys() {
        let config = SourceConfig {
            brave_api_key: Some("   ".into()),
            serper_api_key: Some("key".into()),
            ..Default::default()
        };
        assert_eq!(config.web_credential(WebProvider::Brave), None);
        assert_eq!(config.web_credential(WebProvider::Serper), Some("key"));
        assert_eq!(config.web_credential(WebProvider::Searxng), None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"github_token": "ghp_x"}"#).expect("deserialize");
        assert_eq!(config.github_token.as_deref(), Some("ghp_x"));
        assert_eq!(config.endpoints.hackernews, "https://hn.algolia.com");
    }
}
