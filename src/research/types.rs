//! Research request and report shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scout_search::{RetrievedItem, SourceType};

use crate::tier::{ComplexityClass, ResolvedLimits, SourceLimits};

/// Which sources a research pass may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchToggles {
    pub youtube: bool,
    pub stackoverflow: bool,
    pub github: bool,
    pub reddit: bool,
    pub devto: bool,
    pub hackernews: bool,
    pub forums: bool,
    pub web: bool,
    pub docs: bool,
    pub blogs: bool,
    /// Fetch video transcripts when a transcript service is configured.
    pub include_transcripts: bool,
}

impl Default for ResearchToggles {
    fn default() -> Self {
        Self::all(true)
    }
}

impl ResearchToggles {
    fn all(enabled: bool) -> Self {
        Self {
            youtube: enabled,
            stackoverflow: enabled,
            github: enabled,
            reddit: enabled,
            devto: enabled,
            hackernews: enabled,
            forums: enabled,
            web: enabled,
            docs: enabled,
            blogs: enabled,
            include_transcripts: false,
        }
    }

    /// Only the listed sources.
    pub fn only(sources: &[SourceType]) -> Self {
        let mut toggles = Self::all(false);
        for source in sources {
            toggles.set(*source, true);
        }
        toggles
    }

    pub fn enabled(&self, source: SourceType) -> bool {
        match source {
            SourceType::Youtube => self.youtube,
            SourceType::Stackoverflow => self.stackoverflow,
            SourceType::Github => self.github,
            SourceType::Reddit => self.reddit,
            SourceType::Devto => self.devto,
            SourceType::Hackernews => self.hackernews,
            SourceType::Forums => self.forums,
            SourceType::Web => self.web,
            SourceType::Docs => self.docs,
            SourceType::Blogs => self.blogs,
        }
    }

    pub fn set(&mut self, source: SourceType, enabled: bool) {
        let slot = match source {
            SourceType::Youtube => &mut self.youtube,
            SourceType::Stackoverflow => &mut self.stackoverflow,
            SourceType::Github => &mut self.github,
            SourceType::Reddit => &mut self.reddit,
            SourceType::Devto => &mut self.devto,
            SourceType::Hackernews => &mut self.hackernews,
            SourceType::Forums => &mut self.forums,
            SourceType::Web => &mut self.web,
            SourceType::Docs => &mut self.docs,
            SourceType::Blogs => &mut self.blogs,
        };
        *slot = enabled;
    }
}

/// Input to a research pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub product: String,
    pub base_url: Option<String>,
    /// Per-source item caps and text truncation length.
    pub limits: SourceLimits,
    pub toggles: ResearchToggles,
    /// Cap on the merged list. Defaults to the sum of enabled source limits.
    pub max_results: Option<usize>,
    /// Carried into the report when limits came from the tier resolver.
    pub complexity_class: Option<ComplexityClass>,
    pub limited_by_tier: bool,
    pub upgrade_message: Option<String>,
}

impl ResearchRequest {
    pub fn new(product: impl Into<String>, limits: SourceLimits) -> Self {
        Self {
            product: product.into(),
            base_url: None,
            limits,
            toggles: ResearchToggles::default(),
            max_results: None,
            complexity_class: None,
            limited_by_tier: false,
            upgrade_message: None,
        }
    }

    /// A request using resolved tier limits.
    pub fn from_resolved(product: impl Into<String>, resolved: &ResolvedLimits) -> Self {
        Self {
            complexity_class: Some(resolved.complexity),
            limited_by_tier: resolved.resolution.limited_by_tier,
            upgrade_message: resolved.resolution.upgrade_message.clone(),
            ..Self::new(product, *resolved.enforced())
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_toggles(mut self, toggles: ResearchToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// A source that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSource {
    pub source: SourceType,
    /// Stable error code.
    pub code: String,
    pub error: String,
}

/// Result of a research pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub run_id: Uuid,
    pub product: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Scored items per queried source, after per-source truncation.
    /// Failed sources map to an empty list.
    pub per_source: BTreeMap<SourceType, Vec<RetrievedItem>>,
    /// Provider that answered for each successful source.
    pub providers: BTreeMap<SourceType, String>,
    /// Deduplicated, filtered and ranked items.
    pub items: Vec<RetrievedItem>,
    /// Mean per-source quality; failed sources count as zero.
    pub quality_score: f64,
    /// Category-weighted score of the ranked items.
    pub source_mix_score: f64,
    /// Sources that contributed at least one item.
    pub total_sources: usize,
    pub complexity_class: Option<ComplexityClass>,
    pub failed_sources: Vec<FailedSource>,
    pub limited_by_tier: bool,
    pub upgrade_message: Option<String>,
    /// Limits this pass ran with.
    pub limits: SourceLimits,
}

impl ResearchReport {
    /// Items retrieved across all sources before merging.
    pub fn retrieved_count(&self) -> usize {
        self.per_source.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::{Plan, resolve_limits};

    #[test]
    fn toggles_default_to_every_source() {
        let toggles = ResearchToggles::default();
        assert!(SourceType::all().iter().all(|s| toggles.enabled(*s)));
        assert!(!toggles.include_transcripts);
    }

    #[test]
    fn only_enables_listed_sources() {
        let toggles = ResearchToggles::only(&[SourceType::Docs, SourceType::Web]);
        let enabled: Vec<SourceType> = SourceType::all()
            .iter()
            .copied()
            .filter(|s| toggles.enabled(*s))
            .collect();
        assert_eq!(enabled, vec![SourceType::Web, SourceType::Docs]);
    }

    #[test]
    fn request_from_resolved_limits() {
        let resolved = resolve_limits(Plan::Free, Some(80), None);
        let request = ResearchRequest::from_resolved("stripe", &resolved);
        assert_eq!(request.limits, *resolved.enforced());
        assert_eq!(request.complexity_class, Some(ComplexityClass::Large));
        assert!(request.limited_by_tier);
        assert!(request.upgrade_message.is_some());
    }
}
