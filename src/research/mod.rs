//! Research fan-out across every enabled source.
//!
//! Sources are queried in batches of `aggregator.concurrency`, with
//! `aggregator.batch_delay_ms` between batches. Each source client runs
//! its own fallback chain; a source whose chain fails contributes an empty
//! list and is recorded in [`ResearchReport::failed_sources`] without
//! affecting the others. Completion order does not matter: the merged list
//! is ordered by score.

pub mod types;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use scout_search::merge::merge_ranked;
use scout_search::scoring::quality::category_weighted_quality;
use scout_search::scoring::{aggregate_quality, score_items};
use scout_search::{SearchError, SourceClient, SourceQuery};

use crate::config::AggregatorConfig;
use crate::error::Result;

pub use types::{FailedSource, ResearchReport, ResearchRequest, ResearchToggles};

/// Query every enabled source about `request.product` and merge the results.
///
/// # Errors
///
/// Returns [`SearchError::ProviderUnavailable`] when no enabled source has a
/// client and a non-zero limit. Individual source failures never fail the
/// pass.
pub async fn perform_comprehensive_research(
    clients: &[Arc<dyn SourceClient>],
    settings: &AggregatorConfig,
    request: ResearchRequest,
) -> Result<ResearchReport> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("research", run_id = %run_id, product = request.product.as_str());
    run(run_id, clients, settings, request).instrument(span).await
}

async fn run(
    run_id: Uuid,
    clients: &[Arc<dyn SourceClient>],
    settings: &AggregatorConfig,
    request: ResearchRequest,
) -> Result<ResearchReport> {
    let started_at = chrono::Utc::now();
    let clock = Instant::now();

    let mut seen = HashSet::new();
    let active: Vec<(Arc<dyn SourceClient>, usize)> = clients
        .iter()
        .filter(|client| request.toggles.enabled(client.source_type()))
        .filter(|client| seen.insert(client.source_type()))
        .filter_map(|client| {
            let limit = request.limits.get(client.source_type());
            (limit > 0).then(|| (Arc::clone(client), limit))
        })
        .collect();

    if active.is_empty() {
        return Err(SearchError::ProviderUnavailable(
            "no source is enabled for research".into(),
        )
        .into());
    }

    let mut query = SourceQuery::new(request.product.clone());
    query.base_url = request.base_url.clone();
    query.include_transcripts = request.toggles.include_transcripts;

    tracing::info!(sources = active.len(), "research started");

    let delay = Duration::from_millis(settings.batch_delay_ms);
    let mut outcomes = Vec::with_capacity(active.len());
    for (index, batch) in active.chunks(settings.concurrency.max(1)).enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let fetches = batch.iter().map(|(client, limit)| {
            let query = &query;
            async move {
                let source = client.source_type();
                (source, *limit, client.fetch(query, *limit).await)
            }
        });
        outcomes.extend(join_all(fetches).await);
    }

    let mut per_source = BTreeMap::new();
    let mut providers = BTreeMap::new();
    let mut failed_sources = Vec::new();
    let mut quality_sum = 0.0;

    for (source, limit, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                let mut items = result.data;
                items.truncate(limit);
                for item in &mut items {
                    item.truncate_text(request.limits.max_content_chars);
                }
                score_items(&mut items);
                quality_sum += aggregate_quality(&items, settings.quality_mode);
                tracing::debug!(
                    source = source.name(),
                    provider = result.provider_label.as_str(),
                    from_cache = result.from_cache,
                    count = items.len(),
                    "source contributed"
                );
                providers.insert(source, result.provider_label);
                per_source.insert(source, items);
            }
            Err(err) => {
                tracing::warn!(source = source.name(), code = err.code(), error = %err, "source failed");
                failed_sources.push(FailedSource {
                    source,
                    code: err.code().to_string(),
                    error: err.to_string(),
                });
                per_source.insert(source, Vec::new());
            }
        }
    }

    let attempted = per_source.len();
    let quality_score = quality_sum / attempted as f64;
    let cap = request
        .max_results
        .unwrap_or_else(|| active.iter().map(|(_, limit)| limit).sum());
    let pool: Vec<_> = per_source.values().flatten().cloned().collect();
    let items = merge_ranked(pool, settings.min_trust, Some(cap));
    let source_mix_score = category_weighted_quality(&items);
    let total_sources = per_source.values().filter(|items| !items.is_empty()).count();

    tracing::info!(
        items = items.len(),
        sources = total_sources,
        failed = failed_sources.len(),
        quality = quality_score,
        "research finished"
    );

    Ok(ResearchReport {
        run_id,
        product: request.product,
        started_at,
        duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        per_source,
        providers,
        items,
        quality_score,
        source_mix_score,
        total_sources,
        complexity_class: request.complexity_class,
        failed_sources,
        limited_by_tier: request.limited_by_tier,
        upgrade_message: request.upgrade_message,
        limits: request.limits,
    })
}

