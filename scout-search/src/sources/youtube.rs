//! YouTube videos.
//!
//! The Data API v3 path costs quota: a `search.list` call is charged
//! [`YOUTUBE_SEARCH_COST`] units and the follow-up `videos.list` lookup
//! for statistics [`YOUTUBE_VIDEOS_COST`]. When the daily budget is spent
//! the API operation fails with [`SearchError::QuotaExceeded`] and the
//! chain falls through to web search restricted to `youtube.com`.
//!
//! Transcripts are fetched from an external transcript service when one
//! is configured and the query asks for them. A failed transcript fetch
//! never fails the video.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::quota::{QuotaTracker, YOUTUBE_SEARCH_COST, YOUTUBE_VIDEOS_COST};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::web::build_web_operations;
use super::{SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    items: Vec<VideoStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStats {
    id: String,
    #[serde(default)]
    statistics: Option<Statistics>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

/// The Data API reports counts as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: Option<String>,
    #[serde(default)]
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    transcript: String,
}

/// YouTube video search with a web-search fallback.
#[derive(Debug, Clone)]
pub struct YoutubeClient {
    ctx: SourceContext,
    quota: Arc<QuotaTracker>,
}

impl YoutubeClient {
    /// Create a client charging Data API calls to `quota`.
    pub fn new(ctx: SourceContext, quota: Arc<QuotaTracker>) -> Self {
        Self { ctx, quota }
    }

    fn api_operation(&self, api_key: String, product: &str, limit: usize) -> Operation<Vec<RetrievedItem>> {
        let http = self.ctx.http.clone();
        let base = self.ctx.config.endpoints.youtube.clone();
        let quota = Arc::clone(&self.quota);
        let product = product.to_string();
        Operation::new("youtube:data-api", move || {
            let http = http.clone();
            let base = base.clone();
            let quota = Arc::clone(&quota);
            let api_key = api_key.clone();
            let product = product.clone();
            async move { search_videos(&http, &base, &api_key, &quota, &product, limit).await }
        })
    }
}

#[async_trait]
impl SourceClient for YoutubeClient {
    fn source_type(&self) -> SourceType {
        SourceType::Youtube
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let mut operations = Vec::new();
        if let Some(key) = self
            .ctx
            .config
            .youtube_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
        {
            operations.push(self.api_operation(key.to_string(), &query.product, limit));
        }
        let web_query = format!("site:youtube.com {} tutorial", query.product);
        operations.extend(build_web_operations(&self.ctx, &web_query, limit, SourceType::Youtube));

        let mut result = self.ctx.run(SourceType::Youtube, query, limit, &operations).await?;

        if query.include_transcripts {
            if let Some(service) = self.ctx.config.transcript_service_url.as_deref() {
                attach_transcripts(&self.ctx.http, service, &mut result.data).await;
            }
        }
        Ok(result)
    }
}

/// Search videos and enrich them with statistics.
pub async fn search_videos(
    http: &reqwest::Client,
    base: &str,
    api_key: &str,
    quota: &QuotaTracker,
    product: &str,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    quota.try_consume(YOUTUBE_SEARCH_COST)?;
    tracing::trace!(product, remaining = quota.remaining(), "youtube search");

    let max_results = limit.clamp(1, 50).to_string();
    let q = format!("{product} tutorial");
    let request = http.get(join_url(base, "/youtube/v3/search")).query(&[
        ("part", "snippet"),
        ("type", "video"),
        ("q", q.as_str()),
        ("maxResults", max_results.as_str()),
        ("key", api_key),
    ]);
    let search: SearchListResponse = send_json(request, "youtube").await?;

    let videos: Vec<(String, Snippet)> = search
        .items
        .into_iter()
        .filter_map(|r| r.id.video_id.map(|id| (id, r.snippet)))
        .collect();
    if videos.is_empty() {
        return Ok(Vec::new());
    }

    let stats = match fetch_statistics(http, base, api_key, quota, &videos).await {
        Ok(stats) => stats,
        Err(err) => {
            tracing::warn!(error = %err, "youtube statistics unavailable, continuing without");
            HashMap::new()
        }
    };

    Ok(videos
        .into_iter()
        .map(|(id, snippet)| {
            let (views, likes, duration) = stats.get(&id).cloned().unwrap_or_default();
            RetrievedItem::new(
                SourceType::Youtube,
                snippet.title,
                format!("https://www.youtube.com/watch?v={id}"),
                snippet.description,
            )
            .with_detail(ItemDetail::Video {
                channel: snippet.channel_title,
                views,
                likes,
                duration,
                transcript: None,
            })
        })
        .collect())
}

type VideoNumbers = (u64, u64, Option<String>);

async fn fetch_statistics(
    http: &reqwest::Client,
    base: &str,
    api_key: &str,
    quota: &QuotaTracker,
    videos: &[(String, Snippet)],
) -> Result<HashMap<String, VideoNumbers>, SearchError> {
    quota.try_consume(YOUTUBE_VIDEOS_COST)?;
    let ids = videos
        .iter()
        .map(|(id, _)| id.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let request = http.get(join_url(base, "/youtube/v3/videos")).query(&[
        ("part", "statistics,contentDetails"),
        ("id", ids.as_str()),
        ("key", api_key),
    ]);
    let response: VideoListResponse = send_json(request, "youtube").await?;
    Ok(response
        .items
        .into_iter()
        .map(|video| {
            let (views, likes) = video
                .statistics
                .map(|s| (parse_counter(s.view_count), parse_counter(s.like_count)))
                .unwrap_or_default();
            let duration = video.content_details.and_then(|c| c.duration);
            (video.id, (views, likes, duration))
        })
        .collect())
}

fn parse_counter(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Fetch transcripts for video items in place. Failures are logged and skipped.
pub async fn attach_transcripts(http: &reqwest::Client, service: &str, items: &mut [RetrievedItem]) {
    for item in items.iter_mut() {
        let Some(video_id) = video_id(&item.url) else {
            continue;
        };
        let request = http
            .get(join_url(service, "/transcript"))
            .query(&[("video_id", video_id.as_str())]);
        match send_json::<TranscriptResponse>(request, "transcripts").await {
            Ok(response) => {
                if let ItemDetail::Video { transcript, .. } = &mut item.detail {
                    *transcript = Some(response.transcript);
                } else {
                    item.detail = ItemDetail::Video {
                        channel: String::new(),
                        views: 0,
                        likes: 0,
                        duration: None,
                        transcript: Some(response.transcript),
                    };
                }
            }
            Err(err) => {
                tracing::debug!(video_id = video_id.as_str(), error = %err, "transcript unavailable");
            }
        }
    }
}

/// Video id from a `watch?v=` or `youtu.be/` URL.
pub fn video_id(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    match host {
        "youtube.com" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty()),
        "youtu.be" => url
            .path_segments()
            .and_then(|mut segments| segments.next().map(str::to_string))
            .filter(|id| !id.is_empty()),
        _ => None,
    }
}
