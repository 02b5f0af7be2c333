//! GitHub issues and discussions via the issue search API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{ItemOperations, SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct IssueSearch {
    items: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
    comments: u32,
    #[serde(default)]
    reactions: Option<Reactions>,
    repository_url: String,
}

#[derive(Debug, Deserialize)]
struct Reactions {
    total_count: i64,
}

/// GitHub issue search. Uses the token when present, else anonymous access.
#[derive(Debug, Clone)]
pub struct GithubClient {
    ctx: SourceContext,
}

impl GithubClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, product: &str, limit: usize) -> ItemOperations {
        let url = join_url(&self.ctx.config.endpoints.github, "/search/issues");
        let mut tokens = Vec::new();
        if let Some(token) = self
            .ctx
            .config
            .github_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            tokens.push(("github:token", Some(token.to_string())));
        }
        tokens.push(("github:anonymous", None));

        tokens
            .into_iter()
            .map(|(label, token)| {
                let http = self.ctx.http.clone();
                let url = url.clone();
                let product = product.to_string();
                Operation::new(label, move || {
                    let http = http.clone();
                    let url = url.clone();
                    let product = product.clone();
                    let token = token.clone();
                    async move { search_issues(&http, &url, &product, token.as_deref(), limit).await }
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for GithubClient {
    fn source_type(&self) -> SourceType {
        SourceType::Github
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let operations = self.operations(&query.product, limit);
        self.ctx.run(SourceType::Github, query, limit, &operations).await
    }
}

/// Search issues mentioning `product`, most-reacted first.
pub async fn search_issues(
    http: &reqwest::Client,
    url: &str,
    product: &str,
    token: Option<&str>,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(product, authenticated = token.is_some(), "github issue search");
    let q = format!("{product} in:title,body");
    let per_page = limit.clamp(1, 100).to_string();
    let mut request = http
        .get(url)
        .query(&[
            ("q", q.as_str()),
            ("sort", "reactions"),
            ("order", "desc"),
            ("per_page", per_page.as_str()),
        ])
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response: IssueSearch = send_json(request, "github").await?;
    Ok(response.items.into_iter().map(into_item).collect())
}

fn into_item(issue: Issue) -> RetrievedItem {
    let community = repository_name(&issue.repository_url);
    let snippet = issue.body.unwrap_or_default();
    RetrievedItem::new(SourceType::Github, issue.title, issue.html_url, snippet).with_detail(
        ItemDetail::Post {
            score: issue.reactions.map_or(0, |r| r.total_count),
            comments: issue.comments,
            community,
        },
    )
}

/// `owner/name` from an API repository URL.
fn repository_name(repository_url: &str) -> String {
    let mut parts = repository_url.trim_end_matches('/').rsplit('/');
    match (parts.next(), parts.next()) {
        (Some(name), Some(owner)) => format!("{owner}/{name}"),
        _ => repository_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_name_takes_last_two_segments() {
        assert_eq!(
            repository_name("https://api.github.com/repos/stripe/stripe-node"),
            "stripe/stripe-node"
        );
        assert_eq!(repository_name("x"), "x");
    }

    #[test]
    fn issue_maps_to_post() {
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "title": "Webhook signature fails",
            "html_url": "https://github.com/stripe/stripe-node/issues/1",
            "body": null,
            "comments": 12,
            "reactions": {"total_count": 30},
            "repository_url": "https://api.github.com/repos/stripe/stripe-node"
        }))
        .expect("valid issue");
        let item = into_item(issue);
        assert_eq!(item.snippet, "");
        assert_eq!(
            item.detail,
            ItemDetail::Post {
                score: 30,
                comments: 12,
                community: "stripe/stripe-node".into(),
            }
        );
    }
}
