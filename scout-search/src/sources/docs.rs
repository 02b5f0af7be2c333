//! Official documentation pages discovered from the product's site.
//!
//! The first operation fetches `base_url` and collects same-site links
//! whose path looks like documentation. The fallback reads
//! `/sitemap.xml` and keeps documentation-looking `<loc>` entries. Either
//! operation fails when it finds nothing, so the chain moves on.

use std::collections::HashSet;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::SearchError;
use crate::fallback::Operation;
use crate::http::send_text;
use crate::merge::dedup_key;
use crate::types::{ChainResult, RetrievedItem, SourceType};

use super::{selector, ItemOperations, SourceClient, SourceContext, SourceQuery};

/// Path segments that mark a documentation page.
const DOC_SEGMENTS: &[&str] = &["docs", "doc", "guide", "guides", "reference", "api", "tutorial", "tutorials", "help", "learn"];

/// Documentation link discovery.
#[derive(Debug, Clone)]
pub struct DocsClient {
    ctx: SourceContext,
}

impl DocsClient {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    fn operations(&self, base: &Url, limit: usize) -> ItemOperations {
        let page_http = self.ctx.http.clone();
        let page_base = base.clone();
        let sitemap_http = self.ctx.http.clone();
        let sitemap_base = base.clone();

        vec![
            Operation::new("docs:links", move || {
                let http = page_http.clone();
                let base = page_base.clone();
                async move {
                    let html = send_text(http.get(base.as_str()), "docs").await?;
                    parse_doc_links(&html, &base, limit)
                }
            }),
            Operation::new("docs:sitemap", move || {
                let http = sitemap_http.clone();
                let base = sitemap_base.clone();
                async move {
                    let sitemap = base
                        .join("/sitemap.xml")
                        .map_err(|e| SearchError::Config(format!("docs: bad base url: {e}")))?;
                    let xml = send_text(http.get(sitemap.as_str()), "docs-sitemap").await?;
                    parse_sitemap(&xml, &base, limit)
                }
            }),
        ]
    }
}

#[async_trait]
impl SourceClient for DocsClient {
    fn source_type(&self) -> SourceType {
        SourceType::Docs
    }

    async fn fetch(
        &self,
        query: &SourceQuery,
        limit: usize,
    ) -> Result<ChainResult<Vec<RetrievedItem>>, SearchError> {
        let Some(raw) = query.base_url.as_deref() else {
            return Err(SearchError::ProviderUnavailable(
                "docs: no base_url to crawl".into(),
            ));
        };
        let base = Url::parse(raw)
            .map_err(|e| SearchError::Config(format!("docs: invalid base_url {raw:?}: {e}")))?;
        let operations = self.operations(&base, limit);
        self.ctx.run(SourceType::Docs, query, limit, &operations).await
    }
}

/// Collect same-site documentation links from a page.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_doc_links(
    html: &str,
    base: &Url,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    let document = Html::parse_document(html);
    let link_sel = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for link in document.select(&link_sel) {
        if items.len() >= limit {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !is_doc_url(&resolved, base) || !seen.insert(dedup_key(resolved.as_str())) {
            continue;
        }
        let text = link.text().collect::<Vec<_>>().join(" ");
        let title = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            continue;
        }
        let snippet = link.value().attr("title").unwrap_or_default().to_string();
        items.push(RetrievedItem::new(SourceType::Docs, title, resolved.as_str(), snippet));
    }

    tracing::trace!(count = items.len(), "parsed documentation links");
    if items.is_empty() {
        return Err(SearchError::MalformedResponse(
            "docs: no documentation links on page".into(),
        ));
    }
    Ok(items)
}

/// Collect documentation URLs from a sitemap. Titles come from the last path segment.
pub(crate) fn parse_sitemap(
    xml: &str,
    base: &Url,
    limit: usize,
) -> Result<Vec<RetrievedItem>, SearchError> {
    let document = Html::parse_document(xml);
    let loc_sel = selector("loc")?;

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for loc in document.select(&loc_sel) {
        if items.len() >= limit {
            break;
        }
        let raw = loc.text().collect::<String>();
        let Ok(url) = Url::parse(raw.trim()) else {
            continue;
        };
        if !is_doc_url(&url, base) || !seen.insert(dedup_key(url.as_str())) {
            continue;
        }
        items.push(RetrievedItem::new(SourceType::Docs, title_from_path(&url), url.as_str(), ""));
    }
    if items.is_empty() {
        return Err(SearchError::MalformedResponse(
            "docs-sitemap: no documentation entries".into(),
        ));
    }
    Ok(items)
}

/// Same registrable site as `base` and a documentation-looking path.
fn is_doc_url(url: &Url, base: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let (Some(host), Some(base_host)) = (url.host_str(), base.host_str()) else {
        return false;
    };
    if !same_site(host, base_host) {
        return false;
    }
    let host_is_docs = host.starts_with("docs.") || host.starts_with("developer.");
    (host_is_docs && url.path() != "/") || has_doc_segment(url)
}

/// Some path segment names a documentation section (`/docs/`, `/guides/`, ...).
pub(crate) fn has_doc_segment(url: &Url) -> bool {
    url.path_segments()
        .into_iter()
        .flatten()
        .any(|segment| DOC_SEGMENTS.contains(&segment.to_lowercase().as_str()))
}

/// `host` is the base host or one of its subdomains, ignoring `www.`.
fn same_site(host: &str, base_host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    let base = base_host.trim_start_matches("www.");
    host == base
        || host
            .strip_suffix(base)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn title_from_path(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or_default();
    let words = segment.replace(['-', '_'], " ");
    if words.is_empty() {
        url.as_str().to_string()
    } else {
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://stripe.com").expect("valid url")
    }

    const HOME_HTML: &str = r#"
        <html><body>
          <a href="/docs/payments">Accept   payments</a>
          <a href="/docs/payments?lang=en">Accept payments (en)</a>
          <a href="https://docs.stripe.com/api" title="API reference">API</a>
          <a href="/pricing">Pricing</a>
          <a href="https://github.com/stripe/docs">Elsewhere</a>
          <a href="/guides/webhooks"><img src="x.png"></a>
          <a href="mailto:docs@stripe.com">Mail</a>
        </body></html>
    "#;

    #[test]
    fn collects_same_site_doc_links() {
        let items = parse_doc_links(HOME_HTML, &base(), 10).expect("parse");
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://stripe.com/docs/payments", "https://docs.stripe.com/api"]
        );
        assert_eq!(items[0].title, "Accept payments");
        assert_eq!(items[1].snippet, "API reference");
    }

    #[test]
    fn respects_limit() {
        let items = parse_doc_links(HOME_HTML, &base(), 1).expect("parse");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn sitemap_entries_filtered_to_docs() {
        let xml = r#"<?xml version="1.0"?>
            <urlset>
              <url><loc>https://stripe.com/docs/billing/subscriptions</loc></url>
              <url><loc>https://stripe.com/blog/launch</loc></url>
              <url><loc>https://stripe.com/guides/tax_basics/</loc></url>
            </urlset>"#;
        let items = parse_sitemap(xml, &base(), 10).expect("parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "subscriptions");
        assert_eq!(items[1].title, "tax basics");
    }

    #[test]
    fn page_without_doc_links_is_an_error() {
        let html = r#"<a href="/pricing">Pricing</a>"#;
        assert!(parse_doc_links(html, &base(), 10).is_err());
    }

    #[test]
    fn empty_sitemap_is_an_error() {
        assert!(parse_sitemap("<urlset></urlset>", &base(), 10).is_err());
    }

    #[test]
    fn site_matching_covers_base_host_and_subdomains() {
        assert!(same_site("docs.stripe.com", "www.stripe.com"));
        assert!(same_site("stripe.com", "stripe.com"));
        assert!(!same_site("stripe.dev", "stripe.com"));
        assert!(!same_site("notstripe.com", "stripe.com"));
        assert!(!same_site("foo.co.uk", "bar.co.uk"));
        assert!(!same_site("stripe.com", "docs.stripe.com"));
    }

    #[test]
    fn links_to_sibling_registrable_domains_are_ignored() {
        let base = Url::parse("https://acme.co.uk").expect("valid url");
        let html = r#"<a href="https://acme.co.uk/docs/start">Start</a>
            <a href="https://other.co.uk/docs/start">Elsewhere</a>"#;
        let items = parse_doc_links(html, &base, 10).expect("links");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://acme.co.uk/docs/start");
    }
}
