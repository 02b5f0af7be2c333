//! Stack Overflow questions via the Stack Exchange API.
//!
//! Uses `/2.3/search/advanced` sorted by votes. With an application key
//! the request gets a larger daily quota; the anonymous request is kept
//! as the fallback when the keyed one fails.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{html_text, ItemOperations, SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<Question>,
    #[serde(default)]
    quota_remaining: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    link: String,
    score: i64,
    answer_count: u32,
    view_count: u64,
    #[serde(default)]
    accepted_answer_id: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Stack Overflow question search.
#[derive(Debug, Clone)]
pub struct StackOverflowClient {
    ctx: SourceContext,
}

impl StackOverflowClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, product: &str, limit: usize) -> ItemOperations {
        let url = join_url(&self.ctx.config.endpoints.stackexchange, "/2.3/search/advanced");
        let mut keys = Vec::new();
        if let Some(key) = self
            .ctx
            .config
            .stackexchange_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
        {
            keys.push(("stackexchange:keyed", Some(key.to_string())));
        }
        keys.push(("stackexchange:anonymous", None));

        keys.into_iter()
            .map(|(label, key)| {
                let http = self.ctx.http.clone();
                let url = url.clone();
                let product = product.to_string();
                Operation::new(label, move || {
                    let http = http.clone();
                    let url = url.clone();
                    let product = product.clone();
                    let key = key.clone();
                    async move { search_questions(&http, &url, &product, key.as_deref(), limit).await }
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for StackOverflowClient {
    fn source_type(&self) -> SourceType {
        SourceType::Stackoverflow
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let operations = self.operations(&query.product, limit);
        self.ctx
            .run(SourceType::Stackoverflow, query, limit, &operations)
            .await
    }
}

/// Search questions, most-voted first.
pub async fn search_questions(
    http: &reqwest::Client,
    url: &str,
    product: &str,
    key: Option<&str>,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(product, keyed = key.is_some(), "stack exchange search");
    let pagesize = limit.clamp(1, 100).to_string();
    let mut params = vec![
        ("order", "desc"),
        ("sort", "votes"),
        ("q", product),
        ("site", "stackoverflow"),
        ("filter", "withbody"),
        ("pagesize", pagesize.as_str()),
    ];
    if let Some(key) = key {
        params.push(("key", key));
    }

    let response: SearchResponse = send_json(http.get(url).query(&params), "stackexchange").await?;
    if let Some(remaining) = response.quota_remaining {
        tracing::debug!(remaining, "stack exchange quota");
    }

    Ok(response.items.into_iter().map(into_item).collect())
}

fn into_item(question: Question) -> RetrievedItem {
    let snippet = question.body.as_deref().map(html_text).unwrap_or_default();
    RetrievedItem::new(
        SourceType::Stackoverflow,
        html_text(&question.title),
        question.link,
        snippet,
    )
    .with_detail(ItemDetail::Question {
        votes: question.score,
        answers: question.answer_count,
        views: question.view_count,
        accepted: question.accepted_answer_id.is_some(),
        tags: question.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::fallback::{ExecuteOptions, FallbackExecutor};
    use std::sync::Arc;

    fn client(key: Option<&str>) -> StackOverflowClient {
        let config = SourceConfig {
            stackexchange_key: key.map(str::to_string),
            ..Default::default()
        };
        StackOverflowClient::new(SourceContext::new(
            reqwest::Client::new(),
            Arc::new(config),
            FallbackExecutor::new(),
            ExecuteOptions::default(),
        ))
    }

    #[test]
    fn keyed_request_precedes_anonymous() {
        let ops = client(Some("k")).operations("stripe", 5);
        let labels: Vec<&str> = ops.iter().map(Operation::label).collect();
        assert_eq!(labels, vec!["stackexchange:keyed", "stackexchange:anonymous"]);
    }

    #[test]
    fn blank_key_means_anonymous_only() {
        assert_eq!(client(Some("  ")).operations("stripe", 5).len(), 1);
        assert_eq!(client(None).operations("stripe", 5).len(), 1);
    }

    #[test]
    fn question_maps_to_item() {
        let question: Question = serde_json::from_value(serde_json::json!({
            "title": "Why isn&#39;t my webhook firing?",
            "link": "https://stackoverflow.com/questions/42/why",
            "score": 17,
            "answer_count": 2,
            "view_count": 3400,
            "accepted_answer_id": 43,
            "tags": ["stripe-payments"],
            "body": "<p>My <b>webhook</b> never fires.</p>"
        }))
        .expect("valid question");
        let item = into_item(question);
        assert_eq!(item.title, "Why isn't my webhook firing?");
        assert_eq!(item.snippet, "My webhook never fires.");
        assert_eq!(item.domain, "stackoverflow.com");
        assert_eq!(item.votes(), 17);
        assert!(matches!(item.detail, ItemDetail::Question { accepted: true, .. }));
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let parsed = serde_json::from_str::<SearchResponse>(r#"{"items": [{"title": "x"}]}"#);
        assert!(parsed.is_err());
    }
}
