//! Per-item trust heuristics.
//!
//! Every item starts at [`BASE_TRUST`] and accumulates bounded deltas from
//! the signals its source reports. Each signal is looked up in a bucket
//! table of `(minimum, delta)` pairs ordered from the highest threshold
//! down; the first bucket the value reaches wins. The final score is
//! clamped to `[0, 1]`.
//!
//! # Example
//!
//! ```text
//! Stack Overflow question, 120 votes, 15k views, accepted answer:
//!   0.5 + 0.25 (votes) + 0.10 (views) + 0.10 (accepted) + 0.10 (community) = 1.05 -> 1.0
//! ```

use url::Url;

use crate::sources::docs::has_doc_segment;
use crate::types::{ItemDetail, RetrievedItem, SourceType};

/// Starting trust for every item.
pub const BASE_TRUST: f64 = 0.5;

/// Votes or score on questions and community posts.
pub const VOTE_BUCKETS: &[(i64, f64)] = &[
    (100, 0.25),
    (50, 0.20),
    (20, 0.15),
    (10, 0.10),
    (5, 0.05),
];

/// Applied instead of a vote bucket when the score is negative.
pub const NEGATIVE_VOTE_PENALTY: f64 = -0.10;

/// View counts on questions and videos.
pub const VIEW_BUCKETS: &[(u64, f64)] = &[(100_000, 0.15), (10_000, 0.10), (1_000, 0.05)];

/// Likes on videos.
pub const LIKE_BUCKETS: &[(u64, f64)] = &[(10_000, 0.10), (1_000, 0.05), (100, 0.02)];

/// Comment counts on community posts.
pub const COMMENT_BUCKETS: &[(u32, f64)] = &[(50, 0.05), (10, 0.03)];

/// Reactions on blog articles.
pub const REACTION_BUCKETS: &[(u64, f64)] = &[(100, 0.15), (25, 0.10), (5, 0.05)];

/// Bonus for a question with an accepted answer.
pub const ACCEPTED_ANSWER_BOOST: f64 = 0.10;

/// Hosts treated as official documentation regardless of subdomain.
const DOCS_HOSTS: &[&str] = &[
    "developer.mozilla.org",
    "docs.rs",
    "doc.rust-lang.org",
    "learn.microsoft.com",
    "docs.python.org",
    "developer.apple.com",
    "developer.android.com",
    "cloud.google.com",
];

/// High-quality community sites.
const COMMUNITY_HOSTS: &[&str] = &[
    "stackoverflow.com",
    "stackexchange.com",
    "superuser.com",
    "serverfault.com",
    "github.com",
    "news.ycombinator.com",
    "dev.to",
    "reddit.com",
    "youtube.com",
];

/// Blogging platforms.
const BLOG_HOSTS: &[&str] = &[
    "medium.com",
    "hashnode.dev",
    "substack.com",
    "wordpress.com",
    "blogspot.com",
];

/// Coarse authority class of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainClass {
    /// Official documentation sites.
    OfficialDocs,
    /// Government and academic domains.
    Institutional,
    /// Allow-listed community sites.
    TrustedCommunity,
    /// General blogging platforms.
    BlogPlatform,
    /// Anything else.
    Unknown,
}

impl DomainClass {
    /// Trust delta added for items on a domain of this class.
    pub fn trust_boost(&self) -> f64 {
        match self {
            Self::OfficialDocs | Self::Institutional => 0.20,
            Self::TrustedCommunity => 0.10,
            Self::BlogPlatform | Self::Unknown => 0.0,
        }
    }

    /// Domain authority on `[0, 1]`, used by content validation.
    pub fn authority(&self) -> f64 {
        match self {
            Self::OfficialDocs => 0.95,
            Self::Institutional => 0.90,
            Self::TrustedCommunity => 0.80,
            Self::BlogPlatform => 0.60,
            Self::Unknown => 0.40,
        }
    }
}

/// Look `value` up in a bucket table ordered from the highest threshold down.
///
/// Returns the delta of the first bucket whose minimum `value` reaches, or
/// `0.0` if it reaches none.
pub fn step<T: PartialOrd + Copy>(value: T, buckets: &[(T, f64)]) -> f64 {
    buckets
        .iter()
        .find(|(minimum, _)| value >= *minimum)
        .map_or(0.0, |(_, delta)| *delta)
}

/// Delta for a vote count, including the negative-score penalty.
pub fn vote_delta(votes: i64) -> f64 {
    if votes < 0 {
        NEGATIVE_VOTE_PENALTY
    } else {
        step(votes, VOTE_BUCKETS)
    }
}

/// Classify a bare host name (as stored in [`RetrievedItem::domain`]).
pub fn classify_domain(domain: &str) -> DomainClass {
    let host = domain.trim().trim_start_matches("www.").to_lowercase();
    if host.is_empty() {
        return DomainClass::Unknown;
    }

    if host.starts_with("docs.")
        || host.starts_with("developer.")
        || host.ends_with(".readthedocs.io")
        || DOCS_HOSTS.contains(&host.as_str())
    {
        return DomainClass::OfficialDocs;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels
        .iter()
        .skip(1)
        .any(|label| matches!(*label, "gov" | "edu" | "mil"))
    {
        return DomainClass::Institutional;
    }

    if matches_host(&host, COMMUNITY_HOSTS) {
        return DomainClass::TrustedCommunity;
    }
    if matches_host(&host, BLOG_HOSTS) {
        return DomainClass::BlogPlatform;
    }
    DomainClass::Unknown
}

/// Domain authority on `[0, 1]` for a host name.
pub fn domain_authority(domain: &str) -> f64 {
    classify_domain(domain).authority()
}

/// Classify an item by host, promoting documentation found off a docs host.
///
/// Pages from the docs source, and pages on an otherwise unknown host whose
/// path has a documentation segment (`stripe.com/docs/...`), count as
/// [`DomainClass::OfficialDocs`].
pub fn classify_item(item: &RetrievedItem) -> DomainClass {
    if item.source_type == SourceType::Docs {
        return DomainClass::OfficialDocs;
    }
    let class = classify_domain(&item.domain);
    if class == DomainClass::Unknown
        && Url::parse(&item.url).is_ok_and(|url| has_doc_segment(&url))
    {
        return DomainClass::OfficialDocs;
    }
    class
}

/// Domain authority on `[0, 1]` for an item, see [`classify_item`].
pub fn item_authority(item: &RetrievedItem) -> f64 {
    classify_item(item).authority()
}

/// Compute the clamped trust score of one item from its signals and domain.
pub fn trust_score(item: &RetrievedItem) -> f64 {
    let signals = match &item.detail {
        ItemDetail::Question {
            votes,
            views,
            accepted,
            ..
        } => {
            let accepted = if *accepted { ACCEPTED_ANSWER_BOOST } else { 0.0 };
            vote_delta(*votes) + step(*views, VIEW_BUCKETS) + accepted
        }
        ItemDetail::Video { views, likes, .. } => {
            step(*views, VIEW_BUCKETS) + step(*likes, LIKE_BUCKETS)
        }
        ItemDetail::Post {
            score, comments, ..
        } => vote_delta(*score) + step(*comments, COMMENT_BUCKETS),
        ItemDetail::Article { reactions, .. } => step(*reactions, REACTION_BUCKETS),
        ItemDetail::Page => 0.0,
    };

    let domain = classify_item(item).trust_boost();
    (BASE_TRUST + signals + domain).clamp(0.0, 1.0)
}

/// Fill in `trust_score` for every item. Items without a quality score
/// are ranked by trust.
pub fn score_items(items: &mut [RetrievedItem]) {
    for item in items.iter_mut() {
        item.trust_score = Some(trust_score(item));
    }
}

/// `host` equals an entry or is a subdomain of one.
fn matches_host(host: &str, list: &[&str]) -> bool {
    list.iter().any(|entry| {
        host == *entry
            || host
                .strip_suffix(entry)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;

    fn question(votes: i64, views: u64, accepted: bool) -> RetrievedItem {
        RetrievedItem::new(
            SourceType::Stackoverflow,
            "How do I?",
            "https://stackoverflow.com/questions/1",
            "",
        )
        .with_detail(ItemDetail::Question {
            votes,
            answers: 1,
            views,
            accepted,
            tags: vec![],
        })
    }

    #[test]
    fn step_picks_first_reached_bucket() {
        assert!((step(150i64, VOTE_BUCKETS) - 0.25).abs() < f64::EPSILON);
        assert!((step(50i64, VOTE_BUCKETS) - 0.20).abs() < f64::EPSILON);
        assert!((step(7i64, VOTE_BUCKETS) - 0.05).abs() < f64::EPSILON);
        assert_eq!(step(4i64, VOTE_BUCKETS), 0.0);
        assert_eq!(step(10u64, &[]), 0.0);
    }

    #[test]
    fn negative_votes_are_penalised() {
        assert!((vote_delta(-3) - NEGATIVE_VOTE_PENALTY).abs() < f64::EPSILON);
        assert_eq!(vote_delta(0), 0.0);
    }

    #[test]
    fn bucket_tables_are_descending() {
        assert!(VOTE_BUCKETS.windows(2).all(|w| w[0].0 > w[1].0));
        assert!(VIEW_BUCKETS.windows(2).all(|w| w[0].0 > w[1].0));
        assert!(LIKE_BUCKETS.windows(2).all(|w| w[0].0 > w[1].0));
        assert!(REACTION_BUCKETS.windows(2).all(|w| w[0].0 > w[1].0));
    }

    #[test]
    fn plain_unknown_page_gets_base_trust() {
        let item = RetrievedItem::new(SourceType::Web, "t", "https://random-site.io/x", "");
        assert!((trust_score(&item) - BASE_TRUST).abs() < f64::EPSILON);
    }

    #[test]
    fn popular_accepted_question_is_clamped_to_one() {
        let score = trust_score(&question(120, 15_000, true));
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn modest_question_scores_between() {
        // 0.5 + 0.10 (12 votes) + 0.05 (2k views) + 0.10 (community)
        let score = trust_score(&question(12, 2_000, false));
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn heavily_downvoted_post_on_unknown_site_drops_below_base() {
        let item = RetrievedItem::new(SourceType::Forums, "t", "https://forum.example.org/t/1", "")
            .with_detail(ItemDetail::Post {
                score: -5,
                comments: 0,
                community: "general".into(),
            });
        assert!((trust_score(&item) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn docs_and_institutional_domains_rank_highest() {
        assert_eq!(classify_domain("docs.stripe.com"), DomainClass::OfficialDocs);
        assert_eq!(classify_domain("developer.mozilla.org"), DomainClass::OfficialDocs);
        assert_eq!(classify_domain("tokio.readthedocs.io"), DomainClass::OfficialDocs);
        assert_eq!(classify_domain("nist.gov"), DomainClass::Institutional);
        assert_eq!(classify_domain("cs.stanford.edu"), DomainClass::Institutional);
        assert_eq!(classify_domain("www.ons.gov.uk"), DomainClass::Institutional);
        assert!(domain_authority("docs.rs") > domain_authority("github.com"));
        assert!(domain_authority("github.com") > domain_authority("medium.com"));
        assert!(domain_authority("medium.com") > domain_authority("example.com"));
    }

    #[test]
    fn community_matching_respects_label_boundaries() {
        assert_eq!(classify_domain("meta.stackexchange.com"), DomainClass::TrustedCommunity);
        assert_eq!(classify_domain("notgithub.com"), DomainClass::Unknown);
        assert_eq!(classify_domain("alice.medium.com"), DomainClass::BlogPlatform);
        assert_eq!(classify_domain(""), DomainClass::Unknown);
    }

    #[test]
    fn own_site_docs_pages_count_as_official_docs() {
        let docs = RetrievedItem::new(
            SourceType::Docs,
            "Stripe payments API",
            "https://stripe.com/docs/payments",
            "",
        );
        assert_eq!(classify_domain(&docs.domain), DomainClass::Unknown);
        assert_eq!(classify_item(&docs), DomainClass::OfficialDocs);
        assert!((trust_score(&docs) - 0.7).abs() < 1e-9);

        let web = RetrievedItem::new(SourceType::Web, "Guide", "https://acme.io/guides/setup", "");
        assert_eq!(classify_item(&web), DomainClass::OfficialDocs);
        assert!((item_authority(&web) - 0.95).abs() < f64::EPSILON);

        let post = RetrievedItem::new(SourceType::Web, "Post", "https://acme.io/blog/launch", "");
        assert_eq!(classify_item(&post), DomainClass::Unknown);

        // A docs path on a community host keeps the community class.
        let repo = RetrievedItem::new(SourceType::Github, "Repo docs", "https://github.com/acme/sdk/docs", "");
        assert_eq!(classify_item(&repo), DomainClass::TrustedCommunity);
    }

    #[test]
    fn score_items_fills_trust() {
        let mut items = vec![question(0, 0, false)];
        score_items(&mut items);
        assert!(items[0].trust_score.is_some());
    }

    #[test]
    fn scores_always_within_unit_interval() {
        for votes in [-1000, -1, 0, 3, 9, 49, 10_000] {
            for views in [0, 999, 5_000, 1_000_000] {
                for accepted in [true, false] {
                    let score = trust_score(&question(votes, views, accepted));
                    assert!((0.0..=1.0).contains(&score));
                }
            }
        }
    }
}
