//! Daily unit budgets for quota-limited APIs.
//!
//! The YouTube Data API charges units per call (100 for a search, 1 for a
//! videos lookup) against a daily budget that resets at midnight UTC.
//! [`QuotaTracker`] counts usage with plain atomics and no locking; under
//! heavy concurrency the count is approximate, which is acceptable because
//! the upstream API enforces the real limit.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{Datelike, Utc};

use crate::error::SearchError;

/// Default YouTube Data API daily budget.
pub const YOUTUBE_DAILY_UNITS: u64 = 10_000;
/// Units charged for a `search.list` call.
pub const YOUTUBE_SEARCH_COST: u64 = 100;
/// Units charged for a `videos.list` call.
pub const YOUTUBE_VIDEOS_COST: u64 = 1;

/// Rolling daily unit counter for one API.
#[derive(Debug)]
pub struct QuotaTracker {
    name: String,
    daily_limit: u64,
    used: AtomicU64,
    day: AtomicI64,
}

impl QuotaTracker {
    /// Create a tracker allowing `daily_limit` units per UTC day.
    pub fn new(name: impl Into<String>, daily_limit: u64) -> Self {
        Self {
            name: name.into(),
            daily_limit,
            used: AtomicU64::new(0),
            day: AtomicI64::new(today()),
        }
    }

    /// Charge `units` against today's budget.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::QuotaExceeded`] if the charge would exceed the budget.
    pub fn try_consume(&self, units: u64) -> Result<(), SearchError> {
        self.try_consume_on(today(), units)
    }

    /// Units still available today.
    pub fn remaining(&self) -> u64 {
        self.roll(today());
        self.daily_limit.saturating_sub(self.used.load(Ordering::Relaxed))
    }

    /// Units used so far today.
    pub fn used(&self) -> u64 {
        self.roll(today());
        self.used.load(Ordering::Relaxed)
    }

    fn try_consume_on(&self, day: i64, units: u64) -> Result<(), SearchError> {
        self.roll(day);
        let used = self.used.load(Ordering::Relaxed);
        if used.saturating_add(units) > self.daily_limit {
            return Err(SearchError::QuotaExceeded(format!(
                "{}: {used}/{} units used today",
                self.name, self.daily_limit
            )));
        }
        self.used.fetch_add(units, Ordering::Relaxed);
        Ok(())
    }

    /// Reset the counter when the stored day is behind `day`.
    fn roll(&self, day: i64) {
        let stored = self.day.load(Ordering::Relaxed);
        if stored < day
            && self
                .day
                .compare_exchange(stored, day, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            self.used.store(0, Ordering::Relaxed);
            tracing::debug!(api = self.name.as_str(), "daily quota reset");
        }
    }
}

fn today() -> i64 {
    i64::from(Utc::now().date_naive().num_days_from_ce())
}
