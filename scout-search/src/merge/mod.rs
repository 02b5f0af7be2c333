//! Merging per-source result lists into one ranked list.
//!
//! - [`url_normalize`]: URL keys used to detect duplicates
//! - [`dedup`]: collapse items that share a key, keeping the best
//! - [`merge_ranked`]: dedup, boost, filter, sort and truncate in one step

pub mod dedup;
pub mod url_normalize;

use std::cmp::Ordering;

use crate::types::RetrievedItem;

pub use dedup::{apply_cross_source_boost, deduplicate, DeduplicatedItem};
pub use url_normalize::dedup_key;

/// Merge items from every source into a single ranked list.
///
/// 1. Deduplicate by URL key, keeping the highest-scored item.
/// 2. Boost items that several sources agreed on.
/// 3. Drop items whose trust score is below `min_trust`.
/// 4. Sort by rank score descending, then by URL for a stable order.
/// 5. Keep at most `max_results` items when a cap is given.
pub fn merge_ranked(
    items: Vec<RetrievedItem>,
    min_trust: f64,
    max_results: Option<usize>,
) -> Vec<RetrievedItem> {
    let mut merged: Vec<RetrievedItem> = deduplicate(items)
        .into_iter()
        .map(|group| {
            let mut item = group.item;
            let base = item.rank_score();
            item.quality_score = Some(apply_cross_source_boost(base, group.sources.len()));
            item
        })
        .filter(|item| item.trust_score.unwrap_or(0.0) >= min_trust)
        .collect();

    merged.sort_by(|a, b| {
        b.rank_score()
            .partial_cmp(&a.rank_score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.url.cmp(&b.url))
    });

    if let Some(cap) = max_results {
        merged.truncate(cap);
    }
    merged
}
