//! How many items to request from each source.
//!
//! Complexity is estimated from page count and popularity, mapped to a
//! desired per-source table, then clamped to the subscription plan:
//!
//! ```text
//! page_count, popularity ─▶ ComplexityClass ─▶ smart_scaling ─▶ enforce_tier_limits
//! ```
//!
//! The clamp is component-wise, so every enforced value is at most both
//! the desired value and the plan ceiling.

pub mod complexity;
pub mod enforce;
pub mod limits;

use serde::{Deserialize, Serialize};

pub use complexity::{ComplexityClass, ComplexityThresholds, PopularitySignal, estimate_complexity};
pub use enforce::{TierResolution, enforce_tier_limits, enforce_with};
pub use limits::{Plan, SourceLimits, TierCeilings, smart_scaling};

/// Everything decided about one product's limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLimits {
    pub plan: Plan,
    pub complexity: ComplexityClass,
    /// The table the complexity class asked for.
    pub desired: SourceLimits,
    pub resolution: TierResolution,
}

impl ResolvedLimits {
    /// The limits to apply.
    pub fn enforced(&self) -> &SourceLimits {
        &self.resolution.enforced
    }
}

/// Resolves limits with configured thresholds and ceilings.
#[derive(Debug, Clone, Default)]
pub struct TierResolver {
    thresholds: ComplexityThresholds,
    ceilings: TierCeilings,
}

impl TierResolver {
    pub fn new(thresholds: ComplexityThresholds, ceilings: TierCeilings) -> Self {
        Self {
            thresholds,
            ceilings,
        }
    }

    pub fn ceilings(&self) -> &TierCeilings {
        &self.ceilings
    }

    /// Estimate complexity, scale, and clamp to `plan`.
    pub fn resolve(
        &self,
        plan: Plan,
        page_count: Option<u32>,
        popularity: Option<&PopularitySignal>,
    ) -> ResolvedLimits {
        let complexity = self.thresholds.estimate(page_count, popularity);
        let desired = smart_scaling(complexity);
        let resolution = enforce_with(&self.ceilings, plan, &desired);
        tracing::debug!(
            plan = plan.name(),
            complexity = complexity.name(),
            limited = resolution.limited_by_tier,
            "limits resolved"
        );
        ResolvedLimits {
            plan,
            complexity,
            desired,
            resolution,
        }
    }
}

/// [`TierResolver::resolve`] with the default thresholds and ceilings.
pub fn resolve_limits(
    plan: Plan,
    page_count: Option<u32>,
    popularity: Option<&PopularitySignal>,
) -> ResolvedLimits {
    TierResolver::default().resolve(plan, page_count, popularity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_product_on_free_plan_is_limited() {
        let resolved = resolve_limits(Plan::Free, Some(120), None);
        assert_eq!(resolved.complexity, ComplexityClass::Large);
        assert_eq!(resolved.desired.youtube, 20);
        assert_eq!(resolved.enforced().youtube, 5);
        assert!(resolved.resolution.limited_by_tier);
    }

    #[test]
    fn small_product_on_enterprise_gets_desired() {
        let resolved = resolve_limits(Plan::Enterprise, Some(3), None);
        assert_eq!(resolved.complexity, ComplexityClass::Small);
        assert_eq!(*resolved.enforced(), resolved.desired);
        assert!(!resolved.resolution.limited_by_tier);
    }

    #[test]
    fn resolver_uses_configured_ceilings() {
        let mut ceilings = TierCeilings::default();
        ceilings.pro = SourceLimits::uniform(1, 500);
        let resolver = TierResolver::new(ComplexityThresholds::default(), ceilings);
        let resolved = resolver.resolve(Plan::Pro, Some(3), None);
        assert_eq!(resolved.enforced().total(), 10);
        assert_eq!(resolved.enforced().max_content_chars, 500);
    }
}
