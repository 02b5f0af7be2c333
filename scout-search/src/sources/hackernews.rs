//! Hacker News stories via the Algolia search API.
//!
//! Relevance-ranked search first, then the by-date index as a fallback.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{html_text, ItemOperations, SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    points: Option<i64>,
    #[serde(default)]
    num_comments: Option<u32>,
    #[serde(default)]
    story_text: Option<String>,
}

/// Hacker News story search.
#[derive(Debug, Clone)]
pub struct HackernewsClient {
    ctx: SourceContext,
}

impl HackernewsClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, product: &str, limit: usize) -> ItemOperations {
        [("hackernews:relevance", "/api/v1/search"), ("hackernews:date", "/api/v1/search_by_date")]
            .into_iter()
            .map(|(label, path)| {
                let http = self.ctx.http.clone();
                let url = join_url(&self.ctx.config.endpoints.hackernews, path);
                let product = product.to_string();
                Operation::new(label, move || {
                    let http = http.clone();
                    let url = url.clone();
                    let product = product.clone();
                    async move { search_stories(&http, &url, &product, limit).await }
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for HackernewsClient {
    fn source_type(&self) -> SourceType {
        SourceType::Hackernews
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let operations = self.operations(&query.product, limit);
        self.ctx
            .run(SourceType::Hackernews, query, limit, &operations)
            .await
    }
}

/// Search stories at an Algolia endpoint URL.
pub async fn search_stories(
    http: &reqwest::Client,
    url: &str,
    product: &str,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(product, url, "hackernews search");
    let hits_per_page = limit.clamp(1, 1000).to_string();
    let request = http.get(url).query(&[
        ("query", product),
        ("tags", "story"),
        ("hitsPerPage", hits_per_page.as_str()),
    ]);
    let response: SearchResponse = send_json(request, "hackernews").await?;
    Ok(response.hits.into_iter().filter_map(into_item).collect())
}

/// Stories without a title are skipped; stories without a link point at the discussion.
fn into_item(hit: Hit) -> Option<RetrievedItem> {
    let title = hit.title.filter(|t| !t.trim().is_empty())?;
    let url = hit
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", hit.object_id));
    let snippet = hit.story_text.as_deref().map(html_text).unwrap_or_default();
    Some(
        RetrievedItem::new(SourceType::Hackernews, title, url, snippet).with_detail(ItemDetail::Post {
            score: hit.points.unwrap_or(0),
            comments: hit.num_comments.unwrap_or(0),
            community: "hackernews".into(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(value: serde_json::Value) -> Hit {
        serde_json::from_value(value).expect("valid hit")
    }

    #[test]
    fn ask_hn_links_to_discussion() {
        let item = into_item(hit(serde_json::json!({
            "objectID": "123",
            "title": "Ask HN: Stripe alternatives?",
            "url": null,
            "points": 88,
            "num_comments": 40,
            "story_text": "<p>Looking for options</p>"
        })))
        .expect("titled story");
        assert_eq!(item.url, "https://news.ycombinator.com/item?id=123");
        assert_eq!(item.domain, "news.ycombinator.com");
        assert_eq!(item.snippet, "Looking for options");
        assert_eq!(item.votes(), 88);
    }

    #[test]
    fn untitled_hits_are_skipped() {
        assert!(into_item(hit(serde_json::json!({"objectID": "1"}))).is_none());
    }

    #[test]
    fn object_id_is_required() {
        let parsed = serde_json::from_str::<SearchResponse>(r#"{"hits": [{"title": "x"}]}"#);
        assert!(parsed.is_err());
    }
}
