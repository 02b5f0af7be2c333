//! Discourse community forums.
//!
//! Products commonly host their forum at `community.<domain>` or
//! `forum.<domain>`. Each candidate host becomes one operation in the
//! chain; the first that answers with a Discourse search payload wins.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{ItemOperations, SourceClient, SourceContext, SourceQuery};

/// Subdomains tried, in order, when looking for a product forum.
const FORUM_SUBDOMAINS: &[&str] = &["community", "forum", "discuss"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Present on every Discourse search response; marks the shape.
    #[allow(dead_code)]
    grouped_search_result: serde_json::Value,
    /// Omitted by Discourse when nothing matches.
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    posts: Vec<PostBlurb>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    slug: String,
    title: String,
    posts_count: u32,
    #[serde(default)]
    like_count: i64,
}

#[derive(Debug, Deserialize)]
struct PostBlurb {
    topic_id: u64,
    #[serde(default)]
    blurb: String,
}

/// Discourse forum search across candidate hosts.
#[derive(Debug, Clone)]
pub struct ForumsClient {
    ctx: SourceContext,
}

impl ForumsClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, query: &SourceQuery, limit: usize) -> ItemOperations {
        forum_hosts(query)
            .into_iter()
            .map(|host| {
                let http = self.ctx.http.clone();
                let product = query.product.clone();
                let label = format!("discourse:{}", crate::types::domain_of(&host));
                Operation::new(label, move || {
                    let http = http.clone();
                    let host = host.clone();
                    let product = product.clone();
                    async move { search_forum(&http, &host, &product, limit).await }
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for ForumsClient {
    fn source_type(&self) -> SourceType {
        SourceType::Forums
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let operations = self.operations(query, limit);
        self.ctx.run(SourceType::Forums, query, limit, &operations).await
    }
}

/// Candidate forum base URLs for a query. Empty without a base URL.
///
/// A base URL that already points at a forum host is used as-is.
pub fn forum_hosts(query: &SourceQuery) -> Vec<String> {
    let Some(domain) = query.base_domain() else {
        return Vec::new();
    };
    if FORUM_SUBDOMAINS
        .iter()
        .any(|sub| domain.starts_with(&format!("{sub}.")))
    {
        return vec![format!("https://{domain}")];
    }
    let root = domain
        .strip_prefix("docs.")
        .or_else(|| domain.strip_prefix("developer."))
        .unwrap_or(&domain);
    FORUM_SUBDOMAINS
        .iter()
        .map(|sub| format!("https://{sub}.{root}"))
        .collect()
}

/// Run a Discourse `search.json` query against `host`.
pub async fn search_forum(
    http: &reqwest::Client,
    host: &str,
    product: &str,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(host, product, "discourse search");
    let request = http
        .get(join_url(host, "/search.json"))
        .query(&[("q", product)])
        .header("Accept", "application/json");
    let response: SearchResponse = send_json(request, "discourse").await?;

    let blurbs: HashMap<u64, String> = response
        .posts
        .into_iter()
        .map(|p| (p.topic_id, p.blurb))
        .collect();

    Ok(response
        .topics
        .into_iter()
        .take(limit)
        .map(|topic| {
            let url = join_url(host, &format!("/t/{}/{}", topic.slug, topic.id));
            let snippet = blurbs.get(&topic.id).cloned().unwrap_or_default();
            RetrievedItem::new(SourceType::Forums, topic.title, url, snippet).with_detail(
                ItemDetail::Post {
                    score: topic.like_count,
                    comments: topic.posts_count.saturating_sub(1),
                    community: crate::types::domain_of(host),
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_derived_from_base_domain() {
        let q = SourceQuery::new("Stripe").with_base_url("https://docs.stripe.com");
        assert_eq!(
            forum_hosts(&q),
            vec![
                "https://community.stripe.com",
                "https://forum.stripe.com",
                "https://discuss.stripe.com",
            ]
        );
    }

    #[test]
    fn forum_base_url_used_directly() {
        let q = SourceQuery::new("Rust").with_base_url("https://forum.rust-lang.org/latest");
        assert_eq!(forum_hosts(&q), vec!["https://forum.rust-lang.org"]);
    }

    #[test]
    fn no_base_url_means_no_hosts() {
        assert!(forum_hosts(&SourceQuery::new("Stripe")).is_empty());
    }

    #[test]
    fn non_discourse_payload_is_rejected() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"topics": []}"#).is_err());
        let ok: SearchResponse =
            serde_json::from_str(r#"{"grouped_search_result": {}, "posts": []}"#).expect("shape");
        assert!(ok.topics.is_empty());
    }
}
