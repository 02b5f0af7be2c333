//! Content validation: liveness, relevance, authority and cross-verification.
//!
//! [`ContentValidator::validate`] runs the full pipeline:
//!
//! 1. Drop items whose URL fails a liveness check ([`LinkChecker`]).
//! 2. Score each survivor: `0.6 * authority + 0.4 * relevance`.
//! 3. Keep items at or above the trusted threshold.
//! 4. Deduplicate by URL key and sort by composite score.
//! 5. Flag near-duplicate content among the top K.
//!
//! If steps 1–3 leave nothing from a non-empty input, the validator ranks
//! the original candidates with a cheaper heuristic (trust + authority)
//! and returns the top N, marking the report as a fallback ranking.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use similar::TextDiff;

use crate::merge::dedup_key;
use crate::types::RetrievedItem;

use super::trust::{item_authority, trust_score};
use super::TRUSTED_THRESHOLD;

const AUTHORITY_WEIGHT: f64 = 0.6;
const RELEVANCE_WEIGHT: f64 = 0.4;

/// Words ignored when computing relevance.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it",
    "of", "on", "or", "the", "to", "what", "with",
];

/// Checks whether a URL currently resolves.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    /// `true` if the URL answers with a success or redirect status.
    async fn is_live(&self, url: &str) -> bool;
}

/// [`LinkChecker`] that issues `HEAD`, falling back to `GET` when the
/// server rejects `HEAD`.
#[derive(Debug, Clone)]
pub struct HttpLinkChecker {
    client: reqwest::Client,
}

impl HttpLinkChecker {
    /// Create a checker using the shared HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn is_live(&self, url: &str) -> bool {
        let status = match self.client.head(url).send().await {
            Ok(response) => response.status(),
            Err(err) => {
                tracing::debug!(url, error = %err, "HEAD request failed");
                return false;
            }
        };

        let status = if status == reqwest::StatusCode::METHOD_NOT_ALLOWED
            || status == reqwest::StatusCode::NOT_IMPLEMENTED
        {
            match self.client.get(url).send().await {
                Ok(response) => response.status(),
                Err(err) => {
                    tracing::debug!(url, error = %err, "GET fallback failed");
                    return false;
                }
            }
        } else {
            status
        };

        status.is_success() || status.is_redirection()
    }
}

/// Tuning for [`ContentValidator`].
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Minimum composite score an item needs to be kept.
    pub trusted_threshold: f64,
    /// How many top items are cross-verified for near-duplicate content.
    pub verify_top_k: usize,
    /// How many items the fallback ranking returns.
    pub fallback_top_n: usize,
    /// Word-level similarity at which two items count as near-duplicates.
    pub near_duplicate_ratio: f32,
    /// Maximum concurrent liveness checks.
    pub concurrency: usize,
    /// Whether to run liveness checks at all.
    pub check_links: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            trusted_threshold: TRUSTED_THRESHOLD,
            verify_top_k: 10,
            fallback_top_n: 5,
            near_duplicate_ratio: 0.85,
            concurrency: 8,
            check_links: true,
        }
    }
}

/// An item that passed (or was rescued by) validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedItem {
    pub item: RetrievedItem,
    /// Query term overlap on `[0, 1]`.
    pub relevance: f64,
    /// Domain authority on `[0, 1]`.
    pub authority: f64,
    /// Score the item was ranked by.
    pub composite: f64,
    /// URL of a higher-ranked item with near-identical content.
    pub near_duplicate_of: Option<String>,
}

/// Result of a validation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Ranked items, best first.
    pub items: Vec<ValidatedItem>,
    /// Items removed because their link was dead.
    pub dead_links: usize,
    /// Whether strict filtering produced nothing and the heuristic ranking was used.
    pub used_fallback: bool,
}

/// Validates and ranks retrieved content.
#[derive(Clone)]
pub struct ContentValidator {
    checker: Arc<dyn LinkChecker>,
    options: ValidationOptions,
}

impl std::fmt::Debug for ContentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentValidator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ContentValidator {
    /// Create a validator using `checker` for liveness.
    pub fn new(checker: Arc<dyn LinkChecker>, options: ValidationOptions) -> Self {
        Self { checker, options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Run the validation pipeline over `items` for `query`.
    pub async fn validate(&self, query: &str, items: Vec<RetrievedItem>) -> ValidationReport {
        if items.is_empty() {
            return ValidationReport::default();
        }
        let candidates = items.clone();

        let (live, dead_links) = self.filter_live(items).await;
        let terms = query_terms(query);

        let scored: Vec<ValidatedItem> = live
            .into_iter()
            .map(|item| {
                let relevance = relevance_to_terms(&terms, &item);
                let authority = item_authority(&item);
                ValidatedItem {
                    composite: composite_score(authority, relevance),
                    item,
                    relevance,
                    authority,
                    near_duplicate_of: None,
                }
            })
            .filter(|v| v.composite >= self.options.trusted_threshold)
            .collect();

        let mut ranked = rank_unique(scored);
        if ranked.is_empty() {
            tracing::warn!(
                candidates = candidates.len(),
                dead_links,
                "no items passed validation, using heuristic ranking"
            );
            return ValidationReport {
                items: self.fallback_ranking(&terms, candidates),
                dead_links,
                used_fallback: true,
            };
        }

        let top = ranked.len().min(self.options.verify_top_k);
        cross_verify(&mut ranked[..top], self.options.near_duplicate_ratio);

        tracing::debug!(kept = ranked.len(), dead_links, "validation finished");
        ValidationReport {
            items: ranked,
            dead_links,
            used_fallback: false,
        }
    }

    async fn filter_live(&self, items: Vec<RetrievedItem>) -> (Vec<RetrievedItem>, usize) {
        if !self.options.check_links {
            return (items, 0);
        }
        let total = items.len();
        let checked: Vec<(RetrievedItem, bool)> = stream::iter(items)
            .map(|item| {
                let checker = Arc::clone(&self.checker);
                async move {
                    let live = checker.is_live(&item.url).await;
                    (item, live)
                }
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let live: Vec<RetrievedItem> = checked
            .into_iter()
            .filter_map(|(item, live)| live.then_some(item))
            .collect();
        let dead = total - live.len();
        (live, dead)
    }

    fn fallback_ranking(&self, terms: &[String], candidates: Vec<RetrievedItem>) -> Vec<ValidatedItem> {
        let scored: Vec<ValidatedItem> = candidates
            .into_iter()
            .map(|item| {
                let authority = item_authority(&item);
                let trust = item.trust_score.unwrap_or_else(|| trust_score(&item));
                ValidatedItem {
                    composite: (trust + authority) / 2.0,
                    relevance: relevance_to_terms(terms, &item),
                    authority,
                    item,
                    near_duplicate_of: None,
                }
            })
            .collect();
        let mut ranked = rank_unique(scored);
        ranked.truncate(self.options.fallback_top_n.max(1));
        ranked
    }
}

/// `0.6 * authority + 0.4 * relevance`.
pub fn composite_score(authority: f64, relevance: f64) -> f64 {
    (AUTHORITY_WEIGHT * authority + RELEVANCE_WEIGHT * relevance).clamp(0.0, 1.0)
}

/// Fraction of the query's significant terms found in the item's title or snippet.
pub fn relevance(query: &str, item: &RetrievedItem) -> f64 {
    relevance_to_terms(&query_terms(query), item)
}

fn relevance_to_terms(terms: &[String], item: &RetrievedItem) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let text: HashSet<String> = tokenize(&format!("{} {}", item.title, item.snippet)).collect();
    let hits = terms.iter().filter(|term| text.contains(*term)).count();
    hits as f64 / terms.len() as f64
}

fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Deduplicate by URL key (first occurrence after sorting wins) and sort descending.
fn rank_unique(mut items: Vec<ValidatedItem>) -> Vec<ValidatedItem> {
    items.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item.url.cmp(&b.item.url))
    });
    let mut seen = HashSet::new();
    items.retain(|v| seen.insert(dedup_key(&v.item.url)));
    items
}

/// Flag each item whose content nearly matches a higher-ranked one.
fn cross_verify(items: &mut [ValidatedItem], ratio: f32) {
    for i in 1..items.len() {
        let current = content_of(&items[i].item);
        let duplicate_of = items[..i]
            .iter()
            .find(|earlier| {
                let other = content_of(&earlier.item);
                TextDiff::from_words(other.as_str(), current.as_str()).ratio() >= ratio
            })
            .map(|earlier| earlier.item.url.clone());
        items[i].near_duplicate_of = duplicate_of;
    }
}

fn content_of(item: &RetrievedItem) -> String {
    format!("{} {}", item.title, item.snippet).to_lowercase()
}
