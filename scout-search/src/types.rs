//! Core types for retrieved items and source identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single result retrieved from any external source.
///
/// Every source maps its native response into this shape. The common
/// fields are always present so that scoring and deduplication never
/// need to know which API produced the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Title of the page, question, video or post.
    pub title: String,
    /// Canonical link to the item.
    pub url: String,
    /// Short text excerpt (question body, description, search snippet).
    pub snippet: String,
    /// Which source produced this item.
    pub source_type: SourceType,
    /// Host name of `url`, lowercased, without a leading `www.`.
    pub domain: String,
    /// Per-item trust in `[0, 1]`, filled in by the scorer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    /// Ranking score in `[0, 1]`, filled in by the scorer or validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Type-specific signals.
    #[serde(default)]
    pub detail: ItemDetail,
}

impl RetrievedItem {
    /// Create an item with the common fields; `domain` is derived from `url`.
    pub fn new(
        source_type: SourceType,
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            title: title.into(),
            url,
            snippet: snippet.into(),
            source_type,
            domain,
            trust_score: None,
            quality_score: None,
            detail: ItemDetail::Page,
        }
    }

    /// Attach type-specific detail.
    pub fn with_detail(mut self, detail: ItemDetail) -> Self {
        self.detail = detail;
        self
    }

    /// The score used for ranking: quality if present, else trust, else 0.
    pub fn rank_score(&self) -> f64 {
        self.quality_score.or(self.trust_score).unwrap_or(0.0)
    }

    /// Votes (or equivalent) reported by the source, if any.
    pub fn votes(&self) -> i64 {
        match &self.detail {
            ItemDetail::Question { votes, .. } => *votes,
            ItemDetail::Video { likes, .. } => *likes as i64,
            ItemDetail::Post { score, .. } => *score,
            ItemDetail::Article { reactions, .. } => *reactions as i64,
            ItemDetail::Page => 0,
        }
    }

    /// View count reported by the source, if any.
    pub fn views(&self) -> u64 {
        match &self.detail {
            ItemDetail::Question { views, .. } | ItemDetail::Video { views, .. } => *views,
            _ => 0,
        }
    }

    /// Truncate text fields to at most `max_chars` characters.
    pub fn truncate_text(&mut self, max_chars: usize) {
        truncate_chars(&mut self.snippet, max_chars);
        if let ItemDetail::Video {
            transcript: Some(transcript),
            ..
        } = &mut self.detail
        {
            truncate_chars(transcript, max_chars);
        }
    }
}

/// Type-specific fields carried alongside the common item shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDetail {
    /// A question from a Q&A site.
    Question {
        votes: i64,
        answers: u32,
        views: u64,
        accepted: bool,
        tags: Vec<String>,
    },
    /// A video.
    Video {
        channel: String,
        views: u64,
        likes: u64,
        duration: Option<String>,
        transcript: Option<String>,
    },
    /// A community post (forum thread, issue, story).
    Post {
        score: i64,
        comments: u32,
        community: String,
    },
    /// A blog post or article.
    Article {
        reactions: u64,
        author: Option<String>,
        published_at: Option<String>,
    },
    /// A plain web page with no extra signals.
    #[default]
    Page,
}

/// Sources that scout can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// YouTube videos.
    Youtube,
    /// Stack Overflow questions.
    Stackoverflow,
    /// GitHub issues and discussions.
    Github,
    /// Reddit posts.
    Reddit,
    /// dev.to articles.
    Devto,
    /// Hacker News stories.
    Hackernews,
    /// Discourse community forums.
    Forums,
    /// General web search results.
    Web,
    /// Official documentation pages.
    Docs,
    /// Blog posts from blogging platforms.
    Blogs,
}

impl SourceType {
    /// Returns the stable lowercase name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Stackoverflow => "stackoverflow",
            Self::Github => "github",
            Self::Reddit => "reddit",
            Self::Devto => "devto",
            Self::Hackernews => "hackernews",
            Self::Forums => "forums",
            Self::Web => "web",
            Self::Docs => "docs",
            Self::Blogs => "blogs",
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Youtube => "YouTube videos",
            Self::Stackoverflow => "Stack Overflow questions",
            Self::Github => "GitHub issues",
            Self::Reddit => "Reddit posts",
            Self::Devto => "dev.to articles",
            Self::Hackernews => "Hacker News stories",
            Self::Forums => "forum threads",
            Self::Web => "web results",
            Self::Docs => "documentation pages",
            Self::Blogs => "blog posts",
        }
    }

    /// Category used by the mixed-pool quality weighting.
    pub fn category(&self) -> SourceCategory {
        match self {
            Self::Docs => SourceCategory::Docs,
            Self::Stackoverflow => SourceCategory::Qa,
            Self::Github | Self::Reddit | Self::Hackernews | Self::Forums => SourceCategory::Forum,
            Self::Devto | Self::Blogs => SourceCategory::Blog,
            Self::Youtube | Self::Web => SourceCategory::Other,
        }
    }

    /// Parse a source name as produced by [`SourceType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }

    /// Returns all source variants.
    pub fn all() -> &'static [SourceType] {
        &[
            Self::Youtube,
            Self::Stackoverflow,
            Self::Github,
            Self::Reddit,
            Self::Devto,
            Self::Hackernews,
            Self::Forums,
            Self::Web,
            Self::Docs,
            Self::Blogs,
        ]
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse grouping of sources for quality weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Docs,
    Qa,
    Forum,
    Blog,
    Other,
}

impl SourceCategory {
    /// Fixed weight of this category in the mixed-pool quality score.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Docs => 3.0,
            Self::Qa => 2.0,
            Self::Forum => 1.4,
            Self::Blog => 1.0,
            Self::Other => 0.5,
        }
    }

    /// The largest category weight.
    pub const MAX_WEIGHT: f64 = 3.0;
}

/// Result of a fallback chain execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult<T> {
    /// The value produced by the winning operation (or the cache).
    pub data: T,
    /// Label of the operation that produced `data`.
    pub provider_label: String,
    /// Whether `data` came from the last-resort cache.
    pub from_cache: bool,
}

/// Host of a URL, lowercased and without a leading `www.`. Empty if unparsable.
pub fn domain_of(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}
