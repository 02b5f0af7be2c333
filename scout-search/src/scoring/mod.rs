//! Trust, quality and validation scoring.
//!
//! All scores live on the `[0, 1]` scale.
//!
//! - [`trust`]: per-item trust from source signals and domain authority
//! - [`quality`]: aggregate quality of a result set
//! - [`validation`]: liveness, relevance and cross-verification

pub mod quality;
pub mod trust;
pub mod validation;

pub use quality::{aggregate_quality, QualityMode};
pub use trust::{
    classify_domain, classify_item, domain_authority, item_authority, score_items, trust_score,
    DomainClass,
};
pub use validation::{
    ContentValidator, HttpLinkChecker, LinkChecker, ValidatedItem, ValidationOptions,
    ValidationReport,
};

/// Items with a trust score below this are dropped from merged results.
pub const ITEM_TRUST_FLOOR: f64 = 0.50;

/// Composite score an item needs to pass content validation.
pub const TRUSTED_THRESHOLD: f64 = 0.70;
