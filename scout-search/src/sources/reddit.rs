//! Reddit posts: the JSON search endpoint, then old.reddit HTML search.
//!
//! The JSON endpoint is frequently rate-limited for anonymous clients; the
//! HTML search page on `old.reddit.com` serves the same results without
//! JavaScript and is DOM-queried with `scraper`.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json, send_text};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{parse_count, selector, ItemOperations, SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    permalink: String,
    #[serde(default)]
    selftext: String,
    score: i64,
    num_comments: u32,
    subreddit: String,
}

/// Reddit search.
#[derive(Debug, Clone)]
pub struct RedditClient {
    ctx: SourceContext,
}

impl RedditClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, product: &str, limit: usize) -> ItemOperations {
        let endpoints = &self.ctx.config.endpoints;
        let json_base = endpoints.reddit.clone();
        let html_base = endpoints.reddit_html.clone();
        let http = self.ctx.http.clone();
        let json_product = product.to_string();
        let html_http = self.ctx.http.clone();
        let html_product = product.to_string();

        vec![
            Operation::new("reddit:json", move || {
                let http = http.clone();
                let base = json_base.clone();
                let product = json_product.clone();
                async move { search_json(&http, &base, &product, limit).await }
            }),
            Operation::new("reddit:html", move || {
                let http = html_http.clone();
                let base = html_base.clone();
                let product = html_product.clone();
                async move {
                    let request = http
                        .get(join_url(&base, "/search"))
                        .query(&[("q", product.as_str()), ("sort", "relevance")]);
                    let html = send_text(request, "reddit-html").await?;
                    let mut items = parse_search_html(&html)?;
                    items.truncate(limit);
                    Ok(items)
                }
            }),
        ]
    }
}

#[async_trait]
impl SourceClient for RedditClient {
    fn source_type(&self) -> SourceType {
        SourceType::Reddit
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let operations = self.operations(&query.product, limit);
        self.ctx.run(SourceType::Reddit, query, limit, &operations).await
    }
}

/// Search posts via `search.json`.
pub async fn search_json(
    http: &reqwest::Client,
    base: &str,
    product: &str,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(product, "reddit json search");
    let limit_param = limit.clamp(1, 100).to_string();
    let request = http.get(join_url(base, "/search.json")).query(&[
        ("q", product),
        ("limit", limit_param.as_str()),
        ("sort", "relevance"),
        ("t", "year"),
    ]);
    let listing: Listing = send_json(request, "reddit").await?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| {
            let post = child.data;
            let url = format!("https://www.reddit.com{}", post.permalink);
            RetrievedItem::new(SourceType::Reddit, post.title, url, post.selftext).with_detail(
                ItemDetail::Post {
                    score: post.score,
                    comments: post.num_comments,
                    community: post.subreddit,
                },
            )
        })
        .collect())
}

/// Parse the old.reddit search results page.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_search_html(html: &str) -> Result<Vec<RetrievedItem>, SearchError> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.search-result-link")?;
    let title_sel = selector("a.search-title")?;
    let body_sel = selector("div.search-result-body")?;
    let score_sel = selector("span.search-score")?;
    let comments_sel = selector("a.search-comments")?;
    let subreddit_sel = selector("a.search-subreddit-link")?;

    let mut items = Vec::new();
    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        let Some(href) = title_el.value().attr("href") else {
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let url = if href.starts_with('/') {
            format!("https://www.reddit.com{href}")
        } else {
            href.to_string()
        };

        let text_of = |sel: &Selector| {
            element
                .select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };
        let snippet = text_of(&body_sel);
        let score = parse_count(&text_of(&score_sel)) as i64;
        let comments = parse_count(&text_of(&comments_sel)) as u32;
        let community = text_of(&subreddit_sel)
            .trim_start_matches("r/")
            .to_string();

        items.push(
            RetrievedItem::new(SourceType::Reddit, title, url, snippet).with_detail(ItemDetail::Post {
                score,
                comments,
                community,
            }),
        );
    }

    tracing::trace!(count = items.len(), "parsed reddit html results");
    Ok(items)
}
