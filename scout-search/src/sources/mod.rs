//! Source clients: one per [`SourceType`].
//!
//! Each client implements [`SourceClient`] and protects its upstream API
//! with its own operation chain run through a [`FallbackExecutor`] (for
//! example the Stack Exchange API with a key, then anonymously). Clients
//! map every native response shape into [`RetrievedItem`].
//!
//! | Source          | Chain                                          |
//! |-----------------|------------------------------------------------|
//! | `youtube`       | Data API v3 (quota-tracked) → web `site:` search |
//! | `stackoverflow` | Stack Exchange API keyed → anonymous           |
//! | `github`        | issue search with token → anonymous            |
//! | `reddit`        | `search.json` → old.reddit HTML                |
//! | `devto`         | articles by tag                                |
//! | `hackernews`    | Algolia relevance → by date                    |
//! | `forums`        | Discourse `search.json` per candidate host     |
//! | `web`           | web-search provider chain                      |
//! | `docs`          | documentation links on `base_url` → sitemap    |
//! | `blogs`         | web-search chain restricted to blog platforms  |

pub mod devto;
pub mod docs;
pub mod forums;
pub mod github;
pub mod hackernews;
pub mod reddit;
pub mod stackoverflow;
pub mod web;
pub mod youtube;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::config::SourceConfig;
use crate::error::SearchError;
use crate::fallback::{ExecuteOptions, FallbackExecutor, Operation};
use crate::quota::QuotaTracker;
use crate::types::{ChainResult, RetrievedItem, SourceType};

pub use devto::DevtoClient;
pub use docs::DocsClient;
pub use forums::ForumsClient;
pub use github::GithubClient;
pub use hackernews::HackernewsClient;
pub use reddit::RedditClient;
pub use stackoverflow::StackOverflowClient;
pub use web::{build_web_operations, WebClient};
pub use youtube::YoutubeClient;

/// Chain of operations producing items.
pub type ItemOperations = Vec<Operation<Vec<RetrievedItem>>>;

/// What a research pass asks every source about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQuery {
    /// Product name, used as the search term.
    pub product: String,
    /// Product home or documentation URL, if known.
    pub base_url: Option<String>,
    /// Fetch video transcripts when a transcript service is configured.
    pub include_transcripts: bool,
}

impl SourceQuery {
    /// A query for `product` with no base URL.
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            ..Default::default()
        }
    }

    /// Attach the product's base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Host of the base URL without a leading `www.`.
    pub fn base_domain(&self) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let domain = crate::types::domain_of(base);
        (!domain.is_empty()).then_some(domain)
    }

    fn cache_fragment(&self) -> String {
        format!(
            "{}|{}",
            self.product.trim().to_lowercase(),
            self.base_url.as_deref().unwrap_or_default()
        )
    }
}

/// A client for one external source.
///
/// Implementations must be `Send + Sync` so the aggregator can query
/// many sources concurrently.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which source this client serves.
    fn source_type(&self) -> SourceType;

    /// Fetch at most `limit` items about `query`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ProviderUnavailable`] when the client has
    /// nothing configured to call, or the chain's error when every
    /// operation failed.
    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError>;
}

/// Shared state handed to every source client.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// HTTP client shared by all sources.
    pub http: reqwest::Client,
    /// Credentials and endpoints.
    pub config: Arc<SourceConfig>,
    /// Executor (with the shared cache) used to run each chain.
    pub executor: FallbackExecutor,
    /// Retry, timeout and cancellation settings applied to each chain.
    pub retry: ExecuteOptions,
}

impl SourceContext {
    /// Bundle shared state for source clients.
    pub fn new(
        http: reqwest::Client,
        config: Arc<SourceConfig>,
        executor: FallbackExecutor,
        retry: ExecuteOptions,
    ) -> Self {
        Self {
            http,
            config,
            executor,
            retry,
        }
    }

    /// Run a source's chain, caching under a per-source key, and cap the result.
    pub async fn run(
        &self,
        source: SourceType,
        query: &SourceQuery,
        limit: usize,
        operations: &[Operation<Vec<RetrievedItem>>],
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        if limit == 0 {
            return Ok(ChainResult {
                data: Vec::new(),
                provider_label: source.name().to_string(),
                from_cache: false,
            });
        }
        let opts = self
            .retry
            .clone()
            .with_cache_key(format!("{source}:{}:{limit}", query.cache_fragment()));
        let mut result = self.executor.execute(operations, &opts).await?;
        result.data.truncate(limit);
        tracing::debug!(
            source = source.name(),
            provider = result.provider_label.as_str(),
            from_cache = result.from_cache,
            count = result.data.len(),
            "source fetched"
        );
        Ok(result)
    }
}

/// Build one client per source type.
///
/// `quota` meters the YouTube Data API.
pub fn default_clients(
    ctx: &SourceContext,
    quota: Arc<QuotaTracker>,
) -> Vec<Arc<dyn SourceClient>> {
    vec![
        Arc::new(YoutubeClient::new(ctx.clone(), quota)),
        Arc::new(StackOverflowClient::new(ctx.clone())),
        Arc::new(GithubClient::new(ctx.clone())),
        Arc::new(RedditClient::new(ctx.clone())),
        Arc::new(DevtoClient::new(ctx.clone())),
        Arc::new(HackernewsClient::new(ctx.clone())),
        Arc::new(ForumsClient::new(ctx.clone())),
        Arc::new(WebClient::general(ctx.clone())),
        Arc::new(DocsClient::new(ctx.clone())),
        Arc::new(WebClient::blogs(ctx.clone())),
    ]
}

/// Plain text of an HTML fragment, whitespace collapsed.
pub(crate) fn html_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a CSS selector, mapping failures to [`SearchError::MalformedResponse`].
pub(crate) fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css)
        .map_err(|e| SearchError::MalformedResponse(format!("invalid selector {css:?}: {e:?}")))
}

/// Parse a count such as `"1,234 points"` or `"12"`.
pub(crate) fn parse_count(text: &str) -> u64 {
    let digits: String = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}
