//! Web-search provider chain.
//!
//! Builds one [`Operation`] per configured web-search provider in the
//! configured priority order. Providers without credentials (or, for
//! SearXNG, without an instance URL) are left out of the chain.
//!
//! | Provider | Request                                 | Auth                   |
//! |----------|-----------------------------------------|------------------------|
//! | Brave    | `GET /res/v1/web/search?q=&count=`      | `X-Subscription-Token` |
//! | Serper   | `POST /search {q, num}`                 | `X-API-KEY`            |
//! | Tavily   | `POST /search {query, max_results}`     | `Authorization: Bearer`|
//! | SearXNG  | `GET /search?q=&format=json`            | none                   |

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WebProvider;
use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{ItemOperations, SourceClient, SourceContext, SourceQuery};

/// Blogging platforms searched by the blogs client.
const BLOG_SITES: &[&str] = &["medium.com", "hashnode.dev", "substack.com"];

/// Build the web-search chain for `query`, tagging items as `source_type`.
///
/// Labels are `web:<provider>`.
pub fn build_web_operations(
    ctx: &SourceContext,
    query: &str,
    limit: usize,
    source_type: SourceType,
) -> ItemOperations {
    let mut operations = Vec::new();
    for provider in &ctx.config.web_priority {
        let Some(credential) = ctx.config.web_credential(*provider) else {
            tracing::trace!(provider = provider.name(), "web provider not configured, skipping");
            continue;
        };
        let credential = credential.to_string();
        let base = match provider {
            WebProvider::Brave => ctx.config.endpoints.brave.clone(),
            WebProvider::Serper => ctx.config.endpoints.serper.clone(),
            WebProvider::Tavily => ctx.config.endpoints.tavily.clone(),
            WebProvider::Searxng => credential.clone(),
        };
        let http = ctx.http.clone();
        let query = query.to_string();
        let provider = *provider;

        operations.push(Operation::new(format!("web:{}", provider.name()), move || {
            let http = http.clone();
            let base = base.clone();
            let credential = credential.clone();
            let query = query.clone();
            async move {
                let hits = match provider {
                    WebProvider::Brave => brave_search(&http, &base, &credential, &query, limit).await,
                    WebProvider::Serper => serper_search(&http, &base, &credential, &query, limit).await,
                    WebProvider::Tavily => tavily_search(&http, &base, &credential, &query, limit).await,
                    WebProvider::Searxng => searxng_search(&http, &base, &query).await,
                }?;
                Ok(hits
                    .into_iter()
                    .take(limit)
                    .map(|hit| hit.into_item(source_type))
                    .collect())
            }
        }));
    }
    operations
}

/// A provider-neutral web hit.
#[derive(Debug, Clone, PartialEq)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl WebHit {
    fn into_item(self, source_type: SourceType) -> RetrievedItem {
        let item = RetrievedItem::new(source_type, self.title, self.url, self.snippet);
        match source_type {
            SourceType::Blogs => item.with_detail(ItemDetail::Article {
                reactions: 0,
                author: None,
                published_at: None,
            }),
            _ => item,
        }
    }
}

// ── Brave ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BraveResponse {
    /// Absent when the query has no web results.
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// Query the Brave Search API.
pub async fn brave_search(
    http: &reqwest::Client,
    base: &str,
    api_key: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<WebHit>, SearchError> {
    tracing::trace!(query, "brave search");
    let count = limit.clamp(1, 20).to_string();
    let request = http
        .get(join_url(base, "/res/v1/web/search"))
        .query(&[("q", query), ("count", count.as_str())])
        .header("Accept", "application/json")
        .header("X-Subscription-Token", api_key);
    let response: BraveResponse = send_json(request, "brave").await?;
    Ok(response
        .web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .map(|r| WebHit {
            title: super::html_text(&r.title),
            url: r.url,
            snippet: super::html_text(&r.description),
        })
        .collect())
}

// ── Serper ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SerperResponse {
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Query the Serper API.
pub async fn serper_search(
    http: &reqwest::Client,
    base: &str,
    api_key: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<WebHit>, SearchError> {
    tracing::trace!(query, "serper search");
    let request = http
        .post(join_url(base, "/search"))
        .header("X-API-KEY", api_key)
        .json(&serde_json::json!({ "q": query, "num": limit.max(1) }));
    let response: SerperResponse = send_json(request, "serper").await?;
    Ok(response
        .organic
        .into_iter()
        .map(|r| WebHit {
            title: r.title,
            url: r.link,
            snippet: r.snippet,
        })
        .collect())
}

// ── Tavily ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// Query the Tavily search API.
pub async fn tavily_search(
    http: &reqwest::Client,
    base: &str,
    api_key: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<WebHit>, SearchError> {
    tracing::trace!(query, "tavily search");
    let request = http
        .post(join_url(base, "/search"))
        .bearer_auth(api_key)
        .json(&serde_json::json!({
            "query": query,
            "max_results": limit.max(1),
            "search_depth": "basic",
        }));
    let response: TavilyResponse = send_json(request, "tavily").await?;
    Ok(response
        .results
        .into_iter()
        .map(|r| WebHit {
            title: r.title,
            url: r.url,
            snippet: r.content,
        })
        .collect())
}

// ── SearXNG ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// Query a SearXNG instance's JSON API.
pub async fn searxng_search(
    http: &reqwest::Client,
    base: &str,
    query: &str,
) -> Result<Vec<WebHit>, SearchError> {
    tracing::trace!(query, "searxng search");
    let request = http
        .get(join_url(base, "/search"))
        .query(&[("q", query), ("format", "json")]);
    let response: SearxngResponse = send_json(request, "searxng").await?;
    Ok(response
        .results
        .into_iter()
        .map(|r| WebHit {
            title: r.title,
            url: r.url,
            snippet: r.content,
        })
        .collect())
}

// ── Clients ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebMode {
    General,
    Blogs,
}

/// General web and blog-platform search over the web-search chain.
#[derive(Debug, Clone)]
pub struct WebClient {
    ctx: SourceContext,
    mode: WebMode,
}

impl WebClient {
    /// Client for general web results about the product.
    pub fn general(ctx: SourceContext) -> Self {
        Self {
            ctx,
            mode: WebMode::General,
        }
    }

    /// Client restricted to blogging platforms.
    pub fn blogs(ctx: SourceContext) -> Self {
        Self {
            ctx,
            mode: WebMode::Blogs,
        }
    }

    fn query_text(&self, query: &SourceQuery) -> String {
        match self.mode {
            WebMode::General => format!("{} documentation tutorial", query.product),
            WebMode::Blogs => {
                let sites: Vec<String> = BLOG_SITES.iter().map(|s| format!("site:{s}")).collect();
                format!("{} tutorial ({})", query.product, sites.join(" OR "))
            }
        }
    }
}

#[async_trait]
impl SourceClient for WebClient {
    fn source_type(&self) -> SourceType {
        match self.mode {
            WebMode::General => SourceType::Web,
            WebMode::Blogs => SourceType::Blogs,
        }
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let source = self.source_type();
        let operations = build_web_operations(&self.ctx, &self.query_text(query), limit, source);
        self.ctx.run(source, query, limit, &operations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::fallback::{ExecuteOptions, FallbackExecutor};
    use std::sync::Arc;

    fn ctx(config: SourceConfig) -> SourceContext {
        SourceContext::new(
            reqwest::Client::new(),
            Arc::new(config),
            FallbackExecutor::new(),
            ExecuteOptions::default(),
        )
    }

    #[test]
    fn unconfigured_providers_are_omitted() {
        let ops = build_web_operations(&ctx(SourceConfig::default()), "q", 5, SourceType::Web);
        assert!(ops.is_empty());
    }

    #[test]
    fn chain_follows_priority_order() {
        let mut config = SourceConfig {
            web_priority: vec![WebProvider::Tavily, WebProvider::Searxng, WebProvider::Brave],
            brave_api_key: Some("b".into()),
            tavily_api_key: Some("t".into()),
            serper_api_key: Some("s".into()),
            ..Default::default()
        };
        config.endpoints.searxng = Some("http://localhost:8888".into());
        let ops = build_web_operations(&ctx(config), "q", 5, SourceType::Web);
        let labels: Vec<&str> = ops.iter().map(Operation::label).collect();
        assert_eq!(labels, vec!["web:tavily", "web:searxng", "web:brave"]);
    }

    #[test]
    fn blog_query_restricts_sites() {
        let client = WebClient::blogs(ctx(SourceConfig::default()));
        let text = client.query_text(&SourceQuery::new("Stripe"));
        assert!(text.contains("site:medium.com"));
        assert!(text.contains("site:hashnode.dev"));
        assert_eq!(client.source_type(), SourceType::Blogs);
    }

    #[test]
    fn blog_hits_carry_article_detail() {
        let hit = WebHit {
            title: "t".into(),
            url: "https://medium.com/x".into(),
            snippet: String::new(),
        };
        assert!(matches!(
            hit.clone().into_item(SourceType::Blogs).detail,
            ItemDetail::Article { .. }
        ));
        assert_eq!(hit.into_item(SourceType::Web).detail, ItemDetail::Page);
    }

    #[tokio::test]
    async fn fetch_without_providers_is_unavailable() {
        let client = WebClient::general(ctx(SourceConfig::default()));
        let err = client.fetch(&SourceQuery::new("x"), 5).await.unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
    }
}
