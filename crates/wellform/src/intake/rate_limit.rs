//! Submission rate limiting keyed by source address.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::persistence::StoreError;

/// Default ceiling on submissions per source within one window.
pub const DEFAULT_MAX_SUBMISSIONS: u32 = 10;

/// Default counting window, in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 3_600;

/// Outcome of counting one attempt against a source key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The attempt was admitted and counted; `count` includes it.
    Admitted { count: u32 },
    /// The window is full. The attempt was not counted.
    Limited,
}

/// Storage for per-source attempt counters with a rolling expiry.
///
/// `try_count` must perform the capacity check and the increment as one
/// atomic step, so concurrent submissions from the same source cannot
/// admit more than `max` attempts per window. The window starts at the
/// first counted attempt and expires `window` later; a refused attempt
/// never extends or refreshes it.
pub trait RateCounterStore: Send + Sync {
    fn try_count(
        &self,
        key: &str,
        max: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError>;
}

/// Applies the submission ceiling for one source address.
pub struct RateLimiter {
    counters: Arc<dyn RateCounterStore>,
    max_submissions: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(counters: Arc<dyn RateCounterStore>, max_submissions: u32, window: Duration) -> Self {
        Self {
            counters,
            max_submissions,
            window,
        }
    }

    /// Count one attempt from `source`. A counter store failure admits the
    /// attempt so that a degraded store never blocks intake.
    pub fn check(&self, source: &str, now: DateTime<Utc>) -> RateDecision {
        match self
            .counters
            .try_count(source, self.max_submissions, self.window, now)
        {
            Ok(decision) => decision,
            Err(error) => {
                warn!(source, %error, "rate counter unavailable, admitting attempt");
                RateDecision::Admitted { count: 0 }
            }
        }
    }
}
