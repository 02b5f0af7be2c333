//! Result deduplication by URL key.
//!
//! Groups items that refer to the same page (see
//! [`dedup_key`](super::url_normalize::dedup_key)) and keeps only the
//! highest-scored entry per key. Tracks which sources contributed each
//! URL so that the ranking step can apply a cross-source boost.

use std::collections::HashMap;

use crate::types::{RetrievedItem, SourceType};

use super::url_normalize::dedup_key;

/// An item after deduplication, enriched with the set of sources that
/// returned the same URL.
#[derive(Debug, Clone)]
pub struct DeduplicatedItem {
    /// The best (highest-scored) item for this URL.
    pub item: RetrievedItem,
    /// All sources that returned this URL (including the one on `item`).
    pub sources: Vec<SourceType>,
}

/// Deduplicate items by URL key.
///
/// Items sharing a key are merged: the entry with the highest
/// [`RetrievedItem::rank_score`] is kept (the first seen wins ties), and
/// every contributing source is recorded. Output follows first-seen order.
pub fn deduplicate(items: Vec<RetrievedItem>) -> Vec<DeduplicatedItem> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DeduplicatedItem> = Vec::new();

    for item in items {
        let key = dedup_key(&item.url);
        match positions.get(&key) {
            Some(&idx) => {
                let group = &mut groups[idx];
                if !group.sources.contains(&item.source_type) {
                    group.sources.push(item.source_type);
                }
                if item.rank_score() > group.item.rank_score() {
                    group.item = item;
                }
            }
            None => {
                positions.insert(key, groups.len());
                groups.push(DeduplicatedItem {
                    sources: vec![item.source_type],
                    item,
                });
            }
        }
    }

    groups
}

/// Boost a score for URLs surfaced by several independent sources.
///
/// Each additional source adds 10%, capped at the top of the `[0, 1]` scale.
pub fn apply_cross_source_boost(score: f64, source_count: usize) -> f64 {
    let extra = source_count.saturating_sub(1) as f64;
    (score * (1.0 + 0.1 * extra)).min(1.0)
}
