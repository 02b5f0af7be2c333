//! Shared engine state, built once at startup.
//!
//! [`ScoutRuntime`] owns the TTL cache and the YouTube quota tracker and
//! hands them by `Arc` to every source client, so all chains in the
//! process share one cache and one daily budget.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use scout_search::scoring::{ContentValidator, HttpLinkChecker, LinkChecker, ValidationOptions, ValidationReport};
use scout_search::sources::default_clients;
use scout_search::{QuotaTracker, RetrievedItem, SourceClient, TtlCache};

use crate::config::ScoutConfig;
use crate::error::Result;
use crate::llm::{Completion, CompletionOptions, LlmClient, Message};
use crate::research::{ResearchReport, ResearchRequest, perform_comprehensive_research};
use crate::tier::{Plan, PopularitySignal, ResolvedLimits, TierResolver};

/// The research engine with its shared cache, quota and clients.
pub struct ScoutRuntime {
    config: ScoutConfig,
    cache: Arc<TtlCache>,
    quota: Arc<QuotaTracker>,
    clients: Vec<Arc<dyn SourceClient>>,
    llm: LlmClient,
    tiers: TierResolver,
    validator: ContentValidator,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ScoutRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutRuntime")
            .field("cache", &self.cache)
            .field("quota", &self.quota)
            .field("clients", &self.clients.len())
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl ScoutRuntime {
    /// Validate `config` and build the shared state and every source client.
    ///
    /// # Errors
    ///
    /// Returns a config error if validation fails or an HTTP client cannot
    /// be built.
    pub fn new(config: ScoutConfig) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(TtlCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.max_entries,
        ));
        let quota = Arc::new(QuotaTracker::new("youtube", config.quota.youtube_daily_units));
        let cancel = CancellationToken::new();

        let retry = config.retry.execute_options().with_cancel(cancel.child_token());
        let ctx = scout_search::source_context(config.sources.clone(), Some(Arc::clone(&cache)), retry)?;
        let clients = default_clients(&ctx, Arc::clone(&quota));
        let llm = LlmClient::new(config.llm.clone())?;
        let tiers = TierResolver::new(config.complexity.clone(), config.tiers.clone());
        let checker = Arc::new(HttpLinkChecker::new(ctx.http.clone()));
        let validator = ContentValidator::new(checker, validation_options(&config));

        Ok(Self {
            config,
            cache,
            quota,
            clients,
            llm,
            tiers,
            validator,
            cancel,
        })
    }

    /// Replace the source clients.
    pub fn with_clients(mut self, clients: Vec<Arc<dyn SourceClient>>) -> Self {
        self.clients = clients;
        self
    }

    /// Replace the liveness checker used by [`ScoutRuntime::validate`].
    pub fn with_link_checker(mut self, checker: Arc<dyn LinkChecker>) -> Self {
        self.validator = ContentValidator::new(checker, validation_options(&self.config));
        self
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    /// Start the periodic cache sweep. Stops on [`ScoutRuntime::shutdown`].
    pub fn spawn_cache_sweeper(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(
            Duration::from_secs(self.config.cache.sweep_interval_secs),
            self.cancel.child_token(),
        )
    }

    /// Estimate complexity and clamp limits to `plan`.
    pub fn resolve_limits(
        &self,
        plan: Plan,
        page_count: Option<u32>,
        popularity: Option<&PopularitySignal>,
    ) -> ResolvedLimits {
        self.tiers.resolve(plan, page_count, popularity)
    }

    /// Run a research pass over every client.
    ///
    /// # Errors
    ///
    /// See [`perform_comprehensive_research`].
    pub async fn research(&self, request: ResearchRequest) -> Result<ResearchReport> {
        perform_comprehensive_research(&self.clients, &self.config.aggregator, request).await
    }

    /// Check links, relevance and authority of `items` for `query`.
    pub async fn validate(&self, query: &str, items: Vec<RetrievedItem>) -> ValidationReport {
        self.validator.validate(query, items).await
    }

    /// Generate a completion through the LLM chain.
    ///
    /// # Errors
    ///
    /// See [`LlmClient::complete`].
    pub async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<Completion> {
        let options = CompletionOptions {
            cancel: self.cancel.child_token(),
            ..options.clone()
        };
        Ok(self.llm.complete(messages, &options).await?)
    }

    /// Cancel in-flight chains and the cache sweeper.
    pub fn shutdown(&self) {
        tracing::info!("scout runtime shutting down");
        self.cancel.cancel();
    }
}

fn validation_options(config: &ScoutConfig) -> ValidationOptions {
    ValidationOptions {
        concurrency: config.sources.link_check_concurrency,
        ..ValidationOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_default_client() {
        let runtime = ScoutRuntime::new(ScoutConfig::default()).expect("runtime");
        assert_eq!(runtime.clients.len(), 10);
        assert_eq!(runtime.quota().remaining(), 10_000);
        assert_eq!(runtime.cache().ttl(), Duration::from_secs(900));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ScoutConfig::default();
        config.retry.timeout_ms = 0;
        assert!(ScoutRuntime::new(config).is_err());
    }

    #[test]
    fn limits_use_configured_ceilings() {
        let mut config = ScoutConfig::default();
        config.tiers.free.youtube = 1;
        let runtime = ScoutRuntime::new(config).expect("runtime");
        let resolved = runtime.resolve_limits(Plan::Free, Some(5), None);
        assert_eq!(resolved.enforced().youtube, 1);
    }

    #[test]
    fn validator_uses_configured_link_concurrency() {
        let mut config = ScoutConfig::default();
        config.sources.link_check_concurrency = 3;
        let runtime = ScoutRuntime::new(config).expect("runtime");
        assert_eq!(runtime.validator.options().concurrency, 3);

        let checker = Arc::new(HttpLinkChecker::new(reqwest::Client::new()));
        let runtime = runtime.with_link_checker(checker);
        assert_eq!(runtime.validator.options().concurrency, 3);
    }

    #[tokio::test]
    async fn shutdown_cancels_completions() {
        let mut config = ScoutConfig::default();
        config.llm.openai.api_key = Some("sk-test".into());
        config.llm.openai.base_url = Some("http://127.0.0.1:9".into());
        let runtime = ScoutRuntime::new(config).expect("runtime");
        runtime.shutdown();
        let err = runtime
            .complete(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CANCELLED");
    }
}
