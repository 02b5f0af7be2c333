//! dev.to articles by tag.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::{join_url, send_json};
use crate::types::{ChainResult, ItemDetail, RetrievedItem, SourceType};

use super::{SourceClient, SourceContext, SourceQuery};

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    positive_reactions_count: u64,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    user: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

/// dev.to articles API client.
#[derive(Debug, Clone)]
pub struct DevtoClient {
    ctx: SourceContext,
}

impl DevtoClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SourceClient for DevtoClient {
    fn source_type(&self) -> SourceType {
        SourceType::Devto
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let Some(tag) = tag_for(&query.product) else {
            return Err(SearchError::ProviderUnavailable(format!(
                "devto: no usable tag in {:?}",
                query.product
            )));
        };
        let http = self.ctx.http.clone();
        let base = self.ctx.config.endpoints.devto.clone();
        let operations = vec![Operation::new("devto:tag", move || {
            let http = http.clone();
            let base = base.clone();
            let tag = tag.clone();
            async move { articles_by_tag(&http, &base, &tag, limit).await }
        })];
        self.ctx.run(SourceType::Devto, query, limit, &operations).await
    }
}

/// Fetch the most-reacted articles of the past year for `tag`.
pub async fn articles_by_tag(
    http: &reqwest::Client,
    base: &str,
    tag: &str,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    tracing::trace!(tag, "devto articles");
    let per_page = limit.clamp(1, 1000).to_string();
    let request = http
        .get(join_url(base, "/api/articles"))
        .query(&[("tag", tag), ("per_page", per_page.as_str()), ("top", "365")]);
    let articles: Vec<Article> = send_json(request, "devto").await?;
    Ok(articles
        .into_iter()
        .map(|a| {
            RetrievedItem::new(SourceType::Devto, a.title, a.url, a.description).with_detail(
                ItemDetail::Article {
                    reactions: a.positive_reactions_count,
                    author: a.user.map(|u| u.name),
                    published_at: a.published_at,
                },
            )
        })
        .collect())
}

/// dev.to tags are lowercase alphanumerics.
fn tag_for(product: &str) -> Option<String> {
    let tag: String = product
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!tag.is_empty()).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strips_punctuation() {
        assert_eq!(tag_for("Next.js").as_deref(), Some("nextjs"));
        assert_eq!(tag_for("Stripe Connect").as_deref(), Some("stripeconnect"));
        assert_eq!(tag_for("C++"), Some("c".to_string()));
        assert_eq!(tag_for("!!"), None);
    }

    #[test]
    fn article_requires_reactions_field() {
        let parsed = serde_json::from_str::<Vec<Article>>(r#"[{"title": "t", "url": "u"}]"#);
        assert!(parsed.is_err());
    }
}
