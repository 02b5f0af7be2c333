//! Error types for the scout-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or sensitive data appear in
//! error messages.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// No provider or source has credentials configured.
    pub const PROVIDER_UNAVAILABLE: &str = "PROVIDER_UNAVAILABLE";
    /// A single attempt exceeded its timeout window.
    pub const PROVIDER_TIMEOUT: &str = "PROVIDER_TIMEOUT";
    /// The provider answered with a non-2xx status.
    pub const PROVIDER_HTTP_ERROR: &str = "PROVIDER_HTTP_ERROR";
    /// The request failed before any status was received.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";
    /// Every operation in a chain failed and no cached value was usable.
    pub const ALL_PROVIDERS_EXHAUSTED: &str = "ALL_PROVIDERS_EXHAUSTED";
    /// The provider response did not match the expected shape.
    pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";
    /// A rate-limited API ran out of daily budget.
    pub const QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";
    /// The caller cancelled the operation.
    pub const CANCELLED: &str = "CANCELLED";
    /// Invalid configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
}

/// Errors that can occur while executing provider chains and querying sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// No operation could be built because nothing is configured.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// An attempt did not finish inside its timeout window.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        /// Provider or source label.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Short excerpt of the response body.
        message: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// Every operation in the chain failed. Holds one message per failed attempt.
    #[error("all providers exhausted: {}", .0.join("; "))]
    AllProvidersExhausted(Vec<String>),

    /// The response body could not be parsed into the canonical shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A quota-tracked API has no budget left for today.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The caller cancelled the request.
    #[error("cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Build an HTTP status error, truncating the body excerpt.
    pub fn http(provider: impl Into<String>, status: u16, body: &str) -> Self {
        let message: String = body.chars().take(256).collect();
        Self::Http {
            provider: provider.into(),
            status,
            message,
        }
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) => error_codes::PROVIDER_UNAVAILABLE,
            Self::Timeout(_) => error_codes::PROVIDER_TIMEOUT,
            Self::Http { .. } => error_codes::PROVIDER_HTTP_ERROR,
            Self::Request(_) => error_codes::REQUEST_FAILED,
            Self::AllProvidersExhausted(_) => error_codes::ALL_PROVIDERS_EXHAUSTED,
            Self::MalformedResponse(_) => error_codes::MALFORMED_RESPONSE,
            Self::QuotaExceeded(_) => error_codes::QUOTA_EXCEEDED,
            Self::Cancelled => error_codes::CANCELLED,
            Self::Config(_) => error_codes::CONFIG_INVALID,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// Timeouts, transport failures, 429 and 5xx responses are transient.
    /// Auth failures, other 4xx, malformed payloads and exhausted quotas are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Request(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::ProviderUnavailable(_)
            | Self::AllProvidersExhausted(_)
            | Self::MalformedResponse(_)
            | Self::QuotaExceeded(_)
            | Self::Cancelled
            | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Convenience type alias for scout-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_all_providers_exhausted_lists_every_error() {
        let err = SearchError::AllProvidersExhausted(vec![
            "openai attempt 1: boom".into(),
            "anthropic attempt 1: bang".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "all providers exhausted: openai attempt 1: boom; anthropic attempt 1: bang"
        );
    }

    #[test]
    fn display_http_includes_status_and_provider() {
        let err = SearchError::http("brave", 503, "service unavailable");
        assert_eq!(
            err.to_string(),
            "brave returned HTTP 503: service unavailable"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn http_body_excerpt_is_truncated() {
        let body = "x".repeat(1000);
        let SearchError::Http { message, .. } = SearchError::http("p", 500, &body) else {
            panic!("expected Http variant");
        };
        assert_eq!(message.len(), 256);
    }

    #[test]
    fn display_timeout() {
        let err = SearchError::Timeout("exceeded 8s limit".into());
        assert_eq!(err.to_string(), "timed out: exceeded 8s limit");
    }

    #[test]
    fn codes_are_screaming_snake_case() {
        let errors = [
            SearchError::ProviderUnavailable("x".into()),
            SearchError::Timeout("x".into()),
            SearchError::http("p", 500, "x"),
            SearchError::Request("x".into()),
            SearchError::AllProvidersExhausted(vec![]),
            SearchError::MalformedResponse("x".into()),
            SearchError::QuotaExceeded("x".into()),
            SearchError::Cancelled,
            SearchError::Config("x".into()),
        ];
        for err in &errors {
            let code = err.code();
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn retryable_classification() {
        assert!(SearchError::Timeout("t".into()).is_retryable());
        assert!(SearchError::Request("r".into()).is_retryable());
        assert!(SearchError::http("p", 500, "").is_retryable());
        assert!(SearchError::http("p", 429, "").is_retryable());
        assert!(!SearchError::http("p", 401, "").is_retryable());
        assert!(!SearchError::http("p", 404, "").is_retryable());
        assert!(!SearchError::MalformedResponse("m".into()).is_retryable());
        assert!(!SearchError::QuotaExceeded("q".into()).is_retryable());
    }

    #[test]
    fn status_absent_for_non_http_errors() {
        assert_eq!(SearchError::Timeout("t".into()).status(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
