//! Coarse product complexity from page counts and popularity.

use serde::{Deserialize, Serialize};

/// How much material a product is likely to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityClass {
    Small,
    Medium,
    Large,
}

impl ComplexityClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Popularity signals gathered about a product. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularitySignal {
    /// GitHub stars of the main repository.
    pub github_stars: Option<u64>,
    /// Stack Overflow questions tagged with the product.
    pub stackoverflow_questions: Option<u64>,
    /// Monthly search volume for the product name.
    pub monthly_searches: Option<u64>,
}

/// Page-count and popularity thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    /// Page count at which a product is large.
    pub large_pages: u32,
    /// Page count at which a product is medium.
    pub medium_pages: u32,
    /// Stars that force `large`.
    pub strong_stars: u64,
    /// Questions that force `large`.
    pub strong_questions: u64,
    /// Monthly searches that force `large`.
    pub strong_searches: u64,
    /// Stars that lift `small` to `medium`.
    pub moderate_stars: u64,
    /// Questions that lift `small` to `medium`.
    pub moderate_questions: u64,
    /// Monthly searches that lift `small` to `medium`.
    pub moderate_searches: u64,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            large_pages: 50,
            medium_pages: 10,
            strong_stars: 50_000,
            strong_questions: 10_000,
            strong_searches: 1_000_000,
            moderate_stars: 5_000,
            moderate_questions: 1_000,
            moderate_searches: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Popularity {
    None,
    Moderate,
    Strong,
}

impl ComplexityThresholds {
    /// Classify a product.
    ///
    /// Page count picks the base class. A strong popularity signal forces
    /// `Large`; a moderate one lifts `Small` to `Medium`. With no page
    /// count and no popularity the product is assumed `Medium`.
    pub fn estimate(
        &self,
        page_count: Option<u32>,
        popularity: Option<&PopularitySignal>,
    ) -> ComplexityClass {
        let popularity = popularity.map_or(Popularity::None, |signal| self.popularity(signal));

        let base = match page_count {
            Some(pages) if pages >= self.large_pages => ComplexityClass::Large,
            Some(pages) if pages >= self.medium_pages => ComplexityClass::Medium,
            Some(_) => ComplexityClass::Small,
            None if popularity == Popularity::None => return ComplexityClass::Medium,
            None => ComplexityClass::Small,
        };

        match popularity {
            Popularity::Strong => ComplexityClass::Large,
            Popularity::Moderate => base.max(ComplexityClass::Medium),
            Popularity::None => base,
        }
    }

    fn popularity(&self, signal: &PopularitySignal) -> Popularity {
        let reaches = |value: Option<u64>, threshold: u64| value.is_some_and(|v| v >= threshold);
        if reaches(signal.github_stars, self.strong_stars)
            || reaches(signal.stackoverflow_questions, self.strong_questions)
            || reaches(signal.monthly_searches, self.strong_searches)
        {
            Popularity::Strong
        } else if reaches(signal.github_stars, self.moderate_stars)
            || reaches(signal.stackoverflow_questions, self.moderate_questions)
            || reaches(signal.monthly_searches, self.moderate_searches)
        {
            Popularity::Moderate
        } else {
            Popularity::None
        }
    }
}

/// Classify a product with the default thresholds.
pub fn estimate_complexity(
    page_count: Option<u32>,
    popularity: Option<&PopularitySignal>,
) -> ComplexityClass {
    ComplexityThresholds::default().estimate(page_count, popularity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_thresholds() {
        assert_eq!(estimate_complexity(Some(60), None), ComplexityClass::Large);
        assert_eq!(estimate_complexity(Some(50), None), ComplexityClass::Large);
        assert_eq!(estimate_complexity(Some(15), None), ComplexityClass::Medium);
        assert_eq!(estimate_complexity(Some(10), None), ComplexityClass::Medium);
        assert_eq!(estimate_complexity(Some(5), None), ComplexityClass::Small);
        assert_eq!(estimate_complexity(Some(0), None), ComplexityClass::Small);
    }

    #[test]
    fn unknown_size_defaults_to_medium() {
        assert_eq!(estimate_complexity(None, None), ComplexityClass::Medium);
        let quiet = PopularitySignal::default();
        assert_eq!(estimate_complexity(None, Some(&quiet)), ComplexityClass::Medium);
    }

    #[test]
    fn strong_popularity_forces_large() {
        let stars = PopularitySignal {
            github_stars: Some(80_000),
            ..Default::default()
        };
        assert_eq!(estimate_complexity(Some(3), Some(&stars)), ComplexityClass::Large);

        let searches = PopularitySignal {
            monthly_searches: Some(1_000_000),
            ..Default::default()
        };
        assert_eq!(estimate_complexity(None, Some(&searches)), ComplexityClass::Large);
    }

    #[test]
    fn moderate_popularity_only_lifts_small() {
        let moderate = PopularitySignal {
            stackoverflow_questions: Some(2_500),
            ..Default::default()
        };
        assert_eq!(estimate_complexity(Some(3), Some(&moderate)), ComplexityClass::Medium);
        assert_eq!(estimate_complexity(Some(70), Some(&moderate)), ComplexityClass::Large);
        assert_eq!(estimate_complexity(None, Some(&moderate)), ComplexityClass::Medium);
    }

    #[test]
    fn custom_thresholds() {
        let thresholds = ComplexityThresholds {
            large_pages: 20,
            medium_pages: 5,
            ..Default::default()
        };
        assert_eq!(thresholds.estimate(Some(25), None), ComplexityClass::Large);
        assert_eq!(thresholds.estimate(Some(6), None), ComplexityClass::Medium);
    }

    #[test]
    fn classes_serialize_lowercase() {
        let json = serde_json::to_string(&ComplexityClass::Large).expect("serialize");
        assert_eq!(json, "\"large\"");
    }
}
