//! Complexity estimation and plan clamping through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scout::scout_search::SourceType;
use scout::tier::{
    ComplexityClass, Plan, PopularitySignal, SourceLimits, TierCeilings, enforce_tier_limits,
    estimate_complexity, resolve_limits,
};

const PLANS: [Plan; 4] = [Plan::Free, Plan::Starter, Plan::Pro, Plan::Enterprise];

#[test]
fn page_count_drives_complexity() {
    assert_eq!(estimate_complexity(Some(60), None), ComplexityClass::Large);
    assert_eq!(estimate_complexity(Some(15), None), ComplexityClass::Medium);
    assert_eq!(estimate_complexity(Some(5), None), ComplexityClass::Small);
}

#[test]
fn popularity_lifts_small_products() {
    let popular = PopularitySignal {
        github_stars: Some(80_000),
        ..Default::default()
    };
    assert_eq!(estimate_complexity(Some(5), Some(&popular)), ComplexityClass::Large);
}

#[test]
fn free_plan_clamps_a_large_request() {
    let mut desired = SourceLimits::uniform(5, 2_000);
    desired.youtube = 20;

    let resolution = enforce_tier_limits(Plan::Free, &desired);

    assert_eq!(resolution.enforced.youtube, 5);
    assert!(resolution.limited_by_tier);
    assert_eq!(resolution.constrained, vec!["youtube".to_string()]);
    let message = resolution.upgrade_message.expect("message");
    assert!(message.contains("starter"));
    assert!(message.contains("youtube"));
}

#[test]
fn requests_within_the_ceiling_pass_unchanged() {
    let desired = SourceLimits::uniform(3, 1_000);
    for plan in PLANS {
        let resolution = enforce_tier_limits(plan, &desired);
        assert_eq!(resolution.enforced, desired, "{plan}");
        assert!(!resolution.limited_by_tier);
        assert!(resolution.upgrade_message.is_none());
    }
}

#[test]
fn enforced_never_exceeds_desired_or_ceiling() {
    let ceilings = TierCeilings::default();
    let mut rng = StdRng::seed_from_u64(0x5c07);

    for _ in 0..200 {
        let mut desired = SourceLimits::uniform(0, rng.gen_range(0..20_000));
        for source in SourceType::all() {
            *desired.get_mut(*source) = rng.gen_range(0..150);
        }
        let plan = PLANS[rng.gen_range(0..PLANS.len())];
        let ceiling = ceilings.ceiling(plan);

        let resolution = enforce_tier_limits(plan, &desired);

        for ((name, enforced), ((_, wanted), (_, cap))) in resolution
            .enforced
            .fields()
            .into_iter()
            .zip(desired.fields().into_iter().zip(ceiling.fields()))
        {
            assert_eq!(enforced, wanted.min(cap), "{plan} {name}");
        }
        let clamped = desired.fields().iter().zip(ceiling.fields()).any(|((_, w), (_, c))| w > &c);
        assert_eq!(resolution.limited_by_tier, clamped);
        assert_eq!(resolution.upgrade_message.is_some(), clamped);
    }
}

#[test]
fn higher_plans_never_allow_less() {
    for class_pages in [Some(3), Some(20), Some(120), None] {
        let mut previous: Option<SourceLimits> = None;
        for plan in PLANS {
            let enforced = *resolve_limits(plan, class_pages, None).enforced();
            if let Some(previous) = previous {
                for ((name, lower), (_, higher)) in previous.fields().into_iter().zip(enforced.fields()) {
                    assert!(lower <= higher, "{plan} {name}");
                }
            }
            previous = Some(enforced);
        }
    }
}

#[test]
fn enterprise_large_request_is_not_limited() {
    let resolved = resolve_limits(Plan::Enterprise, Some(500), None);
    assert_eq!(resolved.complexity, ComplexityClass::Large);
    assert!(!resolved.resolution.limited_by_tier);
    assert_eq!(resolved.enforced(), &resolved.desired);
}
