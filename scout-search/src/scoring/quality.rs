//! Aggregate quality of a result set.
//!
//! Two formulas are available:
//!
//! - **Blended**: `0.7 * mean(trust) + 0.3 * mean(engagement)`, where each
//!   item's engagement is `votes + views` capped at [`ENGAGEMENT_CAP`] and
//!   divided by the cap.
//! - **Category-weighted**: the sum of each item's category weight
//!   (docs 3, Q&A 2, forum 1.4, blog 1, other 0.5) divided by
//!   `count * max_weight`.
//!
//! [`QualityMode::Auto`] uses the category-weighted formula once the pool
//! spans [`MIXED_POOL_CATEGORIES`] or more categories.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{RetrievedItem, SourceCategory};

use super::trust::trust_score;

/// Engagement is clamped to this before normalisation.
pub const ENGAGEMENT_CAP: f64 = 10_000.0;

/// Distinct categories at which a pool counts as fully mixed.
pub const MIXED_POOL_CATEGORIES: usize = 3;

const TRUST_WEIGHT: f64 = 0.7;
const ENGAGEMENT_WEIGHT: f64 = 0.3;

/// Which aggregate formula to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    /// Mean trust blended with normalised engagement.
    Blended,
    /// Fixed per-category weights.
    CategoryWeighted,
    /// Pick by how many categories the pool spans.
    #[default]
    Auto,
}

/// Aggregate quality on `[0, 1]`. Empty sets score `0.0`.
pub fn aggregate_quality(items: &[RetrievedItem], mode: QualityMode) -> f64 {
    match mode {
        QualityMode::Blended => blended_quality(items),
        QualityMode::CategoryWeighted => category_weighted_quality(items),
        QualityMode::Auto => {
            if distinct_categories(items) >= MIXED_POOL_CATEGORIES {
                category_weighted_quality(items)
            } else {
                blended_quality(items)
            }
        }
    }
}

/// `0.7 * mean(trust) + 0.3 * mean(normalised engagement)`.
///
/// Items not yet scored are scored on the fly.
pub fn blended_quality(items: &[RetrievedItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let count = items.len() as f64;
    let mean_trust = items
        .iter()
        .map(|item| item.trust_score.unwrap_or_else(|| trust_score(item)))
        .sum::<f64>()
        / count;
    let mean_engagement = items.iter().map(engagement).sum::<f64>() / count;
    (TRUST_WEIGHT * mean_trust + ENGAGEMENT_WEIGHT * mean_engagement).clamp(0.0, 1.0)
}

/// Sum of category weights over `count * max_weight`.
pub fn category_weighted_quality(items: &[RetrievedItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let total: f64 = items
        .iter()
        .map(|item| item.source_type.category().weight())
        .sum();
    total / (items.len() as f64 * SourceCategory::MAX_WEIGHT)
}

/// Normalised engagement of one item on `[0, 1]`.
pub fn engagement(item: &RetrievedItem) -> f64 {
    let votes = item.votes().max(0) as f64;
    let views = item.views() as f64;
    (votes + views).min(ENGAGEMENT_CAP) / ENGAGEMENT_CAP
}

fn distinct_categories(items: &[RetrievedItem]) -> usize {
    items
        .iter()
        .map(|item| item.source_type.category())
        .collect::<HashSet<_>>()
        .len()
}
