//! Ordered fallback chains with per-attempt timeouts, retries and a TTL cache.
//!
//! A chain is a list of [`Operation`]s tried strictly in priority order.
//! The [`FallbackExecutor`] retries each operation with backoff, moves to
//! the next on exhaustion, and finally falls back to the last value cached
//! for the same key before giving up with
//! [`SearchError::AllProvidersExhausted`](crate::SearchError::AllProvidersExhausted).

pub mod cache;
pub mod executor;

pub use cache::{CacheEntry, TtlCache};
pub use executor::{ExecuteOptions, FallbackExecutor, Operation};
