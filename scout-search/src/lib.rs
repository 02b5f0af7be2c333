//! # scout-search
//!
//! Resilient retrieval from many third-party sources.
//!
//! This crate provides the building blocks the `scout` research engine
//! fans out over: an ordered fallback executor, one client per external
//! source, and the heuristics that score and merge what comes back.
//!
//! ## Design
//!
//! - [`FallbackExecutor`] runs an ordered chain of interchangeable
//!   operations with per-attempt timeouts, retries with backoff, and a
//!   last-resort TTL cache
//! - Every source (Q&A, video, community, web search, documentation) is a
//!   [`SourceClient`] that protects its own API with its own chain
//! - Results from every source share one shape, [`RetrievedItem`], so
//!   trust scoring and deduplication never care where an item came from
//! - The TTL cache and the YouTube quota tracker are explicit values,
//!   created once by the caller and shared by `Arc`
//!
//! ## Security
//!
//! - API keys are read from configuration and never logged
//! - Search queries are logged only at trace level
//! - No network listeners: this is a library, not a server

pub mod config;
pub mod error;
pub mod fallback;
pub mod http;
pub mod merge;
pub mod quota;
pub mod scoring;
pub mod sources;
pub mod types;

use std::sync::Arc;

pub use config::{SourceConfig, SourceEndpoints, WebProvider};
pub use error::{Result, SearchError};
pub use fallback::{ExecuteOptions, FallbackExecutor, Operation, TtlCache};
pub use quota::QuotaTracker;
pub use sources::{SourceClient, SourceContext, SourceQuery};
pub use types::{ChainResult, ItemDetail, RetrievedItem, SourceCategory, SourceType};

/// Build the shared [`SourceContext`] every source client is constructed from.
///
/// Validates `config`, builds the shared HTTP client, and wires the
/// executor to `cache` when one is given.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the configuration is invalid or the
/// HTTP client cannot be built.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scout_search::Result<()> {
/// use std::sync::Arc;
/// use std::time::Duration;
/// use scout_search::{ExecuteOptions, SourceClient, SourceConfig, SourceQuery, TtlCache};
///
/// let cache = Arc::new(TtlCache::new(Duration::from_secs(300), 1_000));
/// let ctx = scout_search::source_context(SourceConfig::default(), Some(cache), ExecuteOptions::default())?;
/// let client = scout_search::sources::HackernewsClient::new(ctx);
/// let stories = client.fetch(&SourceQuery::new("stripe"), 5).await?;
/// for item in &stories.data {
///     println!("{}: {}", item.title, item.url);
/// }
/// # Ok(())
/// # }
/// ```
pub fn source_context(
    config: SourceConfig,
    cache: Option<Arc<TtlCache>>,
    retry: ExecuteOptions,
) -> Result<SourceContext> {
    config.validate()?;
    let http = http::build_client(&config)?;
    let executor = match cache {
        Some(cache) => FallbackExecutor::with_cache(cache),
        None => FallbackExecutor::new(),
    };
    Ok(SourceContext::new(http, Arc::new(config), executor, retry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_context_rejects_invalid_config() {
        let config = SourceConfig {
            http_timeout_secs: 0,
            ..Default::default()
        };
        let err = source_context(config, None, ExecuteOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn source_context_builds_with_defaults() {
        let ctx = source_context(SourceConfig::default(), None, ExecuteOptions::default())
            .expect("defaults are valid");
        assert_eq!(ctx.config.http_timeout_secs, 10);
    }
}
