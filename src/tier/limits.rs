//! Per-source item counts and subscription ceilings.

use serde::{Deserialize, Serialize};

use scout_search::SourceType;

use super::complexity::ComplexityClass;

/// Maximum item count per source type plus a text truncation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLimits {
    pub youtube: usize,
    pub stackoverflow: usize,
    pub github: usize,
    pub reddit: usize,
    pub devto: usize,
    pub hackernews: usize,
    pub forums: usize,
    pub web: usize,
    pub docs: usize,
    pub blogs: usize,
    /// Snippets and transcripts are cut to this many characters.
    pub max_content_chars: usize,
}

impl Default for SourceLimits {
    fn default() -> Self {
        smart_scaling(ComplexityClass::Medium)
    }
}

impl SourceLimits {
    /// Same count for every source.
    pub const fn uniform(count: usize, max_content_chars: usize) -> Self {
        Self {
            youtube: count,
            stackoverflow: count,
            github: count,
            reddit: count,
            devto: count,
            hackernews: count,
            forums: count,
            web: count,
            docs: count,
            blogs: count,
            max_content_chars,
        }
    }

    /// Item limit for one source.
    pub fn get(&self, source: SourceType) -> usize {
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

    /// Mutable item limit for one source.
    pub fn get_mut(&mut self, source: SourceType) -> &mut usize {
        match source {
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
        }
    }

    /// Sum of the per-source item limits.
    pub fn total(&self) -> usize {
        SourceType::all().iter().map(|s| self.get(*s)).sum()
    }

    /// Every field as `(name, value)`, item limits first.
    pub fn fields(&self) -> Vec<(&'static str, usize)> {
        let mut fields: Vec<(&'static str, usize)> = SourceType::all()
            .iter()
            .map(|s| (s.name(), self.get(*s)))
            .collect();
        fields.push(("max_content_chars", self.max_content_chars));
        fields
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Self) -> Self {
        let mut out = *self;
        for source in SourceType::all() {
            *out.get_mut(*source) = self.get(*source).min(other.get(*source));
        }
        out.max_content_chars = self.max_content_chars.min(other.max_content_chars);
        out
    }
}

/// Desired per-source counts for a complexity class.
pub fn smart_scaling(class: ComplexityClass) -> SourceLimits {
    let (qa, default, wide, docs, chars) = match class {
        ComplexityClass::Small => (10, 5, 10, 10, 2_000),
        ComplexityClass::Medium => (20, 10, 20, 25, 4_000),
        ComplexityClass::Large => (40, 20, 40, 50, 8_000),
    };
    SourceLimits {
        youtube: default,
        stackoverflow: qa,
        github: default,
        reddit: default,
        devto: default,
        hackernews: default,
        forums: default,
        web: wide,
        docs,
        blogs: default,
        max_content_chars: chars,
    }
}

/// Subscription plans, cheapest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// The next plan up, or `None` on the top plan.
    pub fn next(&self) -> Option<Plan> {
        match self {
            Self::Free => Some(Self::Starter),
            Self::Starter => Some(Self::Pro),
            Self::Pro => Some(Self::Enterprise),
            Self::Enterprise => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(format!("unknown plan {other:?} (expected free, starter, pro or enterprise)")),
        }
    }
}

/// Hard per-plan upper bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCeilings {
    pub free: SourceLimits,
    pub starter: SourceLimits,
    pub pro: SourceLimits,
    pub enterprise: SourceLimits,
}

impl Default for TierCeilings {
    fn default() -> Self {
        let mut free = SourceLimits::uniform(5, 2_000);
        free.docs = 10;
        let mut starter = SourceLimits::uniform(10, 4_000);
        starter.stackoverflow = 20;
        starter.web = 20;
        starter.docs = 20;
        let mut pro = SourceLimits::uniform(20, 8_000);
        pro.stackoverflow = 40;
        pro.web = 40;
        pro.docs = 40;
        let mut enterprise = SourceLimits::uniform(50, 16_000);
        enterprise.stackoverflow = 100;
        enterprise.web = 100;
        enterprise.docs = 100;
        Self {
            free,
            starter,
            pro,
            enterprise,
        }
    }
}

impl TierCeilings {
    /// Ceiling for one plan.
    pub fn ceiling(&self, plan: Plan) -> &SourceLimits {
        match plan {
            Plan::Free => &self.free,
            Plan::Starter => &self.starter,
            Plan::Pro => &self.pro,
            Plan::Enterprise => &self.enterprise,
        }
    }
}
