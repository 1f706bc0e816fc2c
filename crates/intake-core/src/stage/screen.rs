//! Screen stage (§4.3): cheap rejection of malformed or duplicate requests
//! before any expensive work.

use super::{StageOutcome, StageRejection};
use crate::reason::ReasonCode;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub struct ScreenConfig {
    pub max_bytes: u64,
}

/// A pluggable request-rate limiter. Returning `Err` models the limiter
/// itself failing (distinct from the limiter denying the request).
pub trait RateLimiter: Send + Sync {
    fn allow(&self, client_key: &str) -> Result<bool, String>;
}

pub struct ScreenInput<'a> {
    pub payload_bytes: u64,
    pub already_seen: bool,
    pub deadline_ms: Option<i64>,
    pub now_ms: i64,
    pub client_key: &'a str,
    pub rate_limiter: Option<&'a dyn RateLimiter>,
}

pub fn evaluate_screen(input: &ScreenInput<'_>, cfg: &ScreenConfig) -> StageOutcome {
    if input.payload_bytes > cfg.max_bytes {
        return Err(StageRejection::with_context(
            ReasonCode::ScreenTooLarge,
            json!({ "max_bytes": cfg.max_bytes, "payload_bytes": input.payload_bytes }),
        ));
    }

    if input.already_seen {
        return Err(StageRejection::new(ReasonCode::ScreenReplaySeen));
    }

    if let Some(deadline) = input.deadline_ms {
        if deadline < input.now_ms {
            return Err(StageRejection::with_context(
                ReasonCode::ClientExpired,
                json!({ "deadline_ms": deadline, "now_ms": input.now_ms }),
            ));
        }
    }

    if let Some(limiter) = input.rate_limiter {
        match limiter.allow(input.client_key) {
            Ok(true) => {}
            Ok(false) => return Err(StageRejection::new(ReasonCode::ScreenRateLimit)),
            Err(_) => return Err(StageRejection::new(ReasonCode::InternalError)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> ScreenInput<'static> {
        ScreenInput {
            payload_bytes: 100,
            already_seen: false,
            deadline_ms: None,
            now_ms: 1_000,
            client_key: "client-a",
            rate_limiter: None,
        }
    }

    #[test]
    fn size_at_the_limit_is_accepted() {
        let cfg = ScreenConfig { max_bytes: 100 };
        assert!(evaluate_screen(&base_input(), &cfg).is_ok());
    }

    #[test]
    fn size_over_the_limit_is_rejected() {
        let cfg = ScreenConfig { max_bytes: 99 };
        let err = evaluate_screen(&base_input(), &cfg).unwrap_err();
        assert_eq!(err.code, ReasonCode::ScreenTooLarge);
    }

    #[test]
    fn replay_seen_is_rejected() {
        let mut input = base_input();
        input.already_seen = true;
        let cfg = ScreenConfig { max_bytes: 1_000 };
        let err = evaluate_screen(&input, &cfg).unwrap_err();
        assert_eq!(err.code, ReasonCode::ScreenReplaySeen);
    }

    #[test]
    fn deadline_equal_to_now_is_not_expired() {
        let mut input = base_input();
        input.deadline_ms = Some(1_000);
        let cfg = ScreenConfig { max_bytes: 1_000 };
        assert!(evaluate_screen(&input, &cfg).is_ok());
    }

    #[test]
    fn deadline_before_now_is_expired() {
        let mut input = base_input();
        input.deadline_ms = Some(999);
        let cfg = ScreenConfig { max_bytes: 1_000 };
        let err = evaluate_screen(&input, &cfg).unwrap_err();
        assert_eq!(err.code, ReasonCode::ClientExpired);
    }

    struct DenyLimiter;
    impl RateLimiter for DenyLimiter {
        fn allow(&self, _client_key: &str) -> Result<bool, String> {
            Ok(false)
        }
    }

    struct FailingLimiter;
    impl RateLimiter for FailingLimiter {
        fn allow(&self, _client_key: &str) -> Result<bool, String> {
            Err("limiter unavailable".to_string())
        }
    }

    #[test]
    fn rate_limit_denial_is_rejected() {
        let limiter = DenyLimiter;
        let mut input = base_input();
        input.rate_limiter = Some(&limiter);
        let cfg = ScreenConfig { max_bytes: 1_000 };
        let err = evaluate_screen(&input, &cfg).unwrap_err();
        assert_eq!(err.code, ReasonCode::ScreenRateLimit);
    }

    #[test]
    fn rate_limiter_error_is_internal() {
        let limiter = FailingLimiter;
        let mut input = base_input();
        input.rate_limiter = Some(&limiter);
        let cfg = ScreenConfig { max_bytes: 1_000 };
        let err = evaluate_screen(&input, &cfg).unwrap_err();
        assert_eq!(err.code, ReasonCode::InternalError);
    }
}
