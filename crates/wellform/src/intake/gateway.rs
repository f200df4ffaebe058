//! Request gating: action-scoped token verification and source rate limits.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::rate_limit::{RateDecision, RateLimiter};

/// Action scope baked into submit tokens.
pub const SUBMIT_ACTION: &str = "submit_assessment";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SecurityError {
    #[error("security token missing")]
    MissingToken,
    #[error("security token invalid")]
    InvalidToken,
    #[error("too many submissions from this address, please try again later")]
    RateLimited,
}

/// Derive the hex token tying the shared secret to one action scope.
pub fn derive_token(secret: &str, action: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(action.as_bytes());
    hex::encode(hasher.finalize())
}

/// First stage of intake: refuses requests before any field is read.
pub struct IntakeGateway {
    expected_token: String,
    limiter: RateLimiter,
}

impl IntakeGateway {
    pub fn new(secret: &str, limiter: RateLimiter) -> Self {
        Self {
            expected_token: derive_token(secret, SUBMIT_ACTION),
            limiter,
        }
    }

    /// Token a hosting page embeds alongside the form.
    pub fn issue_token(&self) -> &str {
        &self.expected_token
    }

    /// Admit or refuse a raw submission attempt. Token checks run before
    /// the rate counter, so unauthenticated noise never consumes quota.
    pub fn admit(
        &self,
        token: Option<&str>,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SecurityError> {
        let presented = token.ok_or(SecurityError::MissingToken)?;
        if presented != self.expected_token {
            return Err(SecurityError::InvalidToken);
        }

        match self.limiter.check(source, now) {
            RateDecision::Admitted { .. } => Ok(()),
            RateDecision::Limited => Err(SecurityError::RateLimited),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::intake::persistence::StoreError;
    use crate::intake::rate_limit::RateCounterStore;

    struct AlwaysAdmit;

    impl RateCounterStore for AlwaysAdmit {
        fn try_count(
            &self,
            _key: &str,
            _max: u32,
            _window: Duration,
            _now: DateTime<Utc>,
        ) -> Result<RateDecision, StoreError> {
            Ok(RateDecision::Admitted { count: 1 })
        }
    }

    struct AlwaysLimit;

    impl RateCounterStore for AlwaysLimit {
        fn try_count(
            &self,
            _key: &str,
            _max: u32,
            _window: Duration,
            _now: DateTime<Utc>,
        ) -> Result<RateDecision, StoreError> {
            Ok(RateDecision::Limited)
        }
    }

    fn gateway(counters: Arc<dyn RateCounterStore>) -> IntakeGateway {
        let limiter = RateLimiter::new(counters, 10, Duration::seconds(3_600));
        IntakeGateway::new("wizard-secret", limiter)
    }

    #[test]
    fn token_is_scoped_to_the_action() {
        assert_ne!(
            derive_token("wizard-secret", SUBMIT_ACTION),
            derive_token("wizard-secret", "export_results")
        );
        assert_ne!(
            derive_token("wizard-secret", SUBMIT_ACTION),
            derive_token("other-secret", SUBMIT_ACTION)
        );
    }

    #[test]
    fn missing_token_is_refused() {
        let gateway = gateway(Arc::new(AlwaysAdmit));
        let result = gateway.admit(None, "203.0.113.9", Utc::now());
        assert_eq!(result, Err(SecurityError::MissingToken));
    }

    #[test]
    fn wrong_token_is_refused() {
        let gateway = gateway(Arc::new(AlwaysAdmit));
        let result = gateway.admit(Some("deadbeef"), "203.0.113.9", Utc::now());
        assert_eq!(result, Err(SecurityError::InvalidToken));
    }

    #[test]
    fn issued_token_is_accepted() {
        let gateway = gateway(Arc::new(AlwaysAdmit));
        let token = gateway.issue_token().to_string();
        assert_eq!(gateway.admit(Some(&token), "203.0.113.9", Utc::now()), Ok(()));
    }

    #[test]
    fn full_window_is_refused_even_with_a_valid_token() {
        let gateway = gateway(Arc::new(AlwaysLimit));
        let token = gateway.issue_token().to_string();
        let result = gateway.admit(Some(&token), "203.0.113.9", Utc::now());
        assert_eq!(result, Err(SecurityError::RateLimited));
    }
}
