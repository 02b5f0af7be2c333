//! Clamping desired counts against a plan ceiling.

use serde::{Deserialize, Serialize};

use super::limits::{Plan, SourceLimits, TierCeilings};

/// Outcome of clamping desired limits to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResolution {
    /// Limits actually applied: `min(ceiling, desired)` per field.
    pub enforced: SourceLimits,
    /// True when at least one field was reduced.
    pub limited_by_tier: bool,
    /// Suggestion naming the constrained fields, when limited.
    pub upgrade_message: Option<String>,
    /// Names of the fields that were reduced.
    pub constrained: Vec<String>,
}

/// Clamp `desired` to the default ceiling of `plan`.
pub fn enforce_tier_limits(plan: Plan, desired: &SourceLimits) -> TierResolution {
    enforce_with(&TierCeilings::default(), plan, desired)
}

/// Clamp `desired` to `ceilings[plan]`.
pub fn enforce_with(ceilings: &TierCeilings, plan: Plan, desired: &SourceLimits) -> TierResolution {
    let ceiling = ceilings.ceiling(plan);
    let enforced = desired.min(ceiling);

    let constrained: Vec<String> = desired
        .fields()
        .into_iter()
        .zip(enforced.fields())
        .filter(|((_, wanted), (_, applied))| applied < wanted)
        .map(|((name, _), _)| name.to_string())
        .collect();

    let limited_by_tier = !constrained.is_empty();
    let upgrade_message =
        limited_by_tier.then(|| upgrade_message(ceilings, plan, desired, &enforced, &constrained));

    if limited_by_tier {
        tracing::debug!(plan = plan.name(), fields = ?constrained, "limits clamped by plan");
    }

    TierResolution {
        enforced,
        limited_by_tier,
        upgrade_message,
        constrained,
    }
}

fn upgrade_message(
    ceilings: &TierCeilings,
    plan: Plan,
    desired: &SourceLimits,
    enforced: &SourceLimits,
    constrained: &[String],
) -> String {
    let value = |limits: &SourceLimits, name: &str| {
        limits
            .fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map_or(0, |(_, v)| v)
    };

    let reduced = constrained
        .iter()
        .map(|name| format!("{name} {} of {}", value(enforced, name), value(desired, name)))
        .collect::<Vec<_>>()
        .join(", ");

    match plan.next() {
        Some(next) => {
            let next_ceiling = ceilings.ceiling(next);
            let raised = constrained
                .iter()
                .map(|name| format!("{name} {}", value(desired, name).min(value(next_ceiling, name))))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "The {plan} plan limited this run ({reduced}). Upgrade to {next} for up to: {raised}."
            )
        }
        None => format!(
            "The {plan} plan limited this run ({reduced}); these are the maximum limits available."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::complexity::ComplexityClass;
    use crate::tier::limits::smart_scaling;

    #[test]
    fn free_plan_clamps_large_request() {
        let desired = SourceLimits {
            youtube: 20,
            ..SourceLimits::uniform(1, 1_000)
        };
        let resolution = enforce_tier_limits(Plan::Free, &desired);
        assert_eq!(resolution.enforced.youtube, 5);
        assert!(resolution.limited_by_tier);
        assert_eq!(resolution.constrained, vec!["youtube".to_string()]);
        let message = resolution.upgrade_message.expect("message");
        assert!(message.contains("youtube 5 of 20"), "{message}");
        assert!(message.contains("Upgrade to starter"), "{message}");
        assert!(message.contains("youtube 10"), "{message}");
    }

    #[test]
    fn within_ceiling_is_untouched() {
        let desired = smart_scaling(ComplexityClass::Small);
        let resolution = enforce_tier_limits(Plan::Pro, &desired);
        assert_eq!(resolution.enforced, desired);
        assert!(!resolution.limited_by_tier);
        assert!(resolution.upgrade_message.is_none());
        assert!(resolution.constrained.is_empty());
    }

    #[test]
    fn content_length_is_clamped_too() {
        let desired = SourceLimits::uniform(1, 50_000);
        let resolution = enforce_tier_limits(Plan::Enterprise, &desired);
        assert_eq!(resolution.enforced.max_content_chars, 16_000);
        assert_eq!(resolution.constrained, vec!["max_content_chars".to_string()]);
        let message = resolution.upgrade_message.expect("message");
        assert!(message.contains("maximum"), "{message}");
    }
}
