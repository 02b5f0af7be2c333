//! The fallback chain executor.
//!
//! # Retry policy
//!
//! - Operations are tried strictly one at a time, in the order given.
//! - Each operation gets up to `max_retries + 1` attempts. Every attempt
//!   races against its own fresh timeout window.
//! - Between attempts the executor sleeps `backoff_base * 2^attempt`
//!   (or a fixed `backoff_base` when exponential backoff is off).
//! - On success the value is cached under `(cache_key, index)` and
//!   returned; later operations are never invoked.
//! - When every operation is exhausted, any unexpired cached value for the
//!   same key is returned with `from_cache = true`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::cache::TtlCache;
use crate::error::SearchError;
use crate::types::ChainResult;

/// Upper bound on the backoff exponent so delays cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 10;

type OperationFn<T> = dyn Fn() -> BoxFuture<'static, Result<T, SearchError>> + Send + Sync;

/// One zero-argument asynchronous unit of work in a chain.
///
/// The closure is invoked once per attempt, so each attempt issues a
/// fresh request.
pub struct Operation<T> {
    label: String,
    run: Box<OperationFn<T>>,
}

impl<T> Operation<T> {
    /// Wrap a closure producing a future as a labelled operation.
    pub fn new<F, Fut>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SearchError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            run: Box::new(move || Box::pin(run())),
        }
    }

    /// Label reported as `provider_label` when this operation wins.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T> std::fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("label", &self.label)
            .finish()
    }
}

/// Options controlling a single chain execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Retries per operation after the first attempt.
    pub max_retries: u32,
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    /// Double the delay after each failed attempt.
    pub exponential_backoff: bool,
    /// Base delay between attempts.
    pub backoff_base: Duration,
    /// Whether to write successes to, and fall back on, the cache.
    pub use_cache: bool,
    /// Key under which results are cached. Caching is disabled without one.
    pub cache_key: Option<String>,
    /// Cancels the whole chain, aborting the in-flight attempt.
    pub cancel: CancellationToken,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(30),
            exponential_backoff: true,
            backoff_base: Duration::from_millis(500),
            use_cache: false,
            cache_key: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl ExecuteOptions {
    /// Enable caching under `key`.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.use_cache = true;
        self.cache_key = Some(key.into());
        self
    }

    /// Set the retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the backoff base delay and mode.
    pub fn with_backoff(mut self, base: Duration, exponential: bool) -> Self {
        self.backoff_base = base;
        self.exponential_backoff = exponential;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Delay to wait after the failed attempt with 0-based index `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.exponential_backoff {
            self.backoff_base
                .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_EXPONENT))
        } else {
            self.backoff_base
        }
    }
}

/// Executes ordered operation chains.
///
/// Holds an optional shared [`TtlCache`]; construct one executor per
/// component and share the cache between them.
#[derive(Debug, Clone, Default)]
pub struct FallbackExecutor {
    cache: Option<Arc<TtlCache>>,
}

impl FallbackExecutor {
    /// An executor without a cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor backed by a shared cache store.
    pub fn with_cache(cache: Arc<TtlCache>) -> Self {
        Self { cache: Some(cache) }
    }

    /// Run `operations` in priority order until one succeeds.
    ///
    /// # Errors
    ///
    /// - [`SearchError::ProviderUnavailable`] if `operations` is empty.
    /// - [`SearchError::Cancelled`] if `opts.cancel` fires.
    /// - [`SearchError::AllProvidersExhausted`] if every attempt failed and
    ///   no unexpired cached value exists. The payload lists each failure.
    pub async fn execute<T>(
        &self,
        operations: &[Operation<T>],
        opts: &ExecuteOptions,
    ) -> Result<ChainResult<T>, SearchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        if operations.is_empty() {
            return Err(SearchError::ProviderUnavailable(
                "no operations configured".into(),
            ));
        }

        let cache_key = self.cache_key(opts);
        let mut failures: Vec<String> = Vec::new();

        for (index, operation) in operations.iter().enumerate() {
            for attempt in 0..=opts.max_retries {
                match run_attempt(operation, opts).await {
                    Ok(data) => {
                        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                            cache.set(key, index, operation.label(), &data).await;
                        }
                        if !failures.is_empty() {
                            tracing::info!(
                                provider = operation.label(),
                                failures = failures.len(),
                                "fallback chain recovered"
                            );
                        }
                        return Ok(ChainResult {
                            data,
                            provider_label: operation.label().to_string(),
                            from_cache: false,
                        });
                    }
                    Err(SearchError::Cancelled) => return Err(SearchError::Cancelled),
                    Err(err) => {
                        tracing::warn!(
                            provider = operation.label(),
                            attempt = attempt + 1,
                            max_attempts = opts.max_retries + 1,
                            retryable = err.is_retryable(),
                            error = %err,
                            "operation attempt failed"
                        );
                        failures.push(format!("{} attempt {}: {err}", operation.label(), attempt + 1));

                        if attempt < opts.max_retries {
                            let delay = opts.backoff_delay(attempt);
                            tokio::select! {
                                biased;
                                () = opts.cancel.cancelled() => return Err(SearchError::Cancelled),
                                () = tokio::time::sleep(delay) => {}
                            }
                        }
                    }
                }
            }
        }

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            for index in 0..operations.len() {
                if let Some((data, provider_label)) = cache.get_typed::<T>(key, index).await {
                    tracing::warn!(
                        key,
                        provider = provider_label.as_str(),
                        "all operations failed, serving cached result"
                    );
                    return Ok(ChainResult {
                        data,
                        provider_label,
                        from_cache: true,
                    });
                }
            }
        }

        Err(SearchError::AllProvidersExhausted(failures))
    }

    fn cache_key<'a>(&self, opts: &'a ExecuteOptions) -> Option<&'a str> {
        if !opts.use_cache || self.cache.is_none() {
            return None;
        }
        match opts.cache_key.as_deref() {
            Some(key) => Some(key),
            None => {
                tracing::warn!("caching requested without a cache key; caching disabled for this call");
                None
            }
        }
    }
}

/// Race one attempt against its timeout and the caller's cancellation.
///
/// Losing the race drops the attempt future, which aborts any in-flight
/// HTTP request it owns.
async fn run_attempt<T>(operation: &Operation<T>, opts: &ExecuteOptions) -> Result<T, SearchError> {
    let attempt = (operation.run)();
    tokio::select! {
        biased;
        () = opts.cancel.cancelled() => Err(SearchError::Cancelled),
        outcome = tokio::time::timeout(opts.timeout, attempt) => match outcome {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(format!(
                "{} exceeded {}ms",
                operation.label(),
                opts.timeout.as_millis()
            ))),
        },
    }
}
