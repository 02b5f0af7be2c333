//! Shared HTTP client and response helpers for source requests.
//!
//! Provides a configured [`reqwest::Client`] with a rotating browser-like
//! User-Agent, plus helpers that turn non-2xx responses into
//! [`SearchError::Http`] and unexpected JSON shapes into
//! [`SearchError::MalformedResponse`].

use std::time::Duration;

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;

use crate::config::SourceConfig;
use crate::error::SearchError;

/// Realistic browser User-Agent strings, one chosen per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] shared by every source client.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(config: &SourceConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Send a request and read the body as text, mapping non-2xx statuses.
pub async fn send_text(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<String, SearchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::debug!(provider, status = status.as_u16(), "provider returned error status");
        return Err(SearchError::http(provider, status.as_u16(), &body));
    }
    tracing::trace!(provider, bytes = body.len(), "response received");
    Ok(body)
}

/// Send a request and decode the body into `T`.
///
/// Missing required fields or wrong types surface as
/// [`SearchError::MalformedResponse`] rather than being defaulted.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T, SearchError> {
    let body = send_text(request, provider).await?;
    parse_json(&body, provider)
}

/// Decode a JSON body into `T`, naming the provider on failure.
pub fn parse_json<T: DeserializeOwned>(body: &str, provider: &str) -> Result<T, SearchError> {
    serde_json::from_str(body)
        .map_err(|e| SearchError::MalformedResponse(format!("{provider}: {e}")))
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
