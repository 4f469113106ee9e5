use super::allowlist::AllowList;
use super::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::error::DenialReason;
use crate::identity::UserId;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed
    Allowed,
    /// Caller is not on the allowlist
    DeniedNotAllowlisted,
    /// Caller exhausted the rate budget
    DeniedRateLimited {
        /// Time until a slot frees up
        retry_after: Duration,
    },
}

impl Decision {
    /// Whether the caller may proceed
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// The denial reason, if denied
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Allowed => None,
            Self::DeniedNotAllowlisted => Some(DenialReason::NotAllowlisted),
            Self::DeniedRateLimited { retry_after } => Some(DenialReason::RateLimited {
                retry_after_secs: retry_after.as_secs_f64().ceil() as u64,
            }),
        }
    }
}

/// Allowlist check followed by the rate check
#[derive(Debug)]
pub struct SecurityGate {
    allowlist: AllowList,
    limiter: RateLimiter,
}

impl SecurityGate {
    /// Create a gate
    #[must_use]
    pub fn new(allowlist: AllowList, rate_limit: RateLimitConfig) -> Self {
        Self {
            allowlist,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    /// Authorize one call. Only an allowed call consumes budget.
    pub fn authorize(&self, user: &UserId) -> Decision {
        if !self.allowlist.contains(user) {
            warn!(user = %user, "Rejected caller not on allowlist");
            return Decision::DeniedNotAllowlisted;
        }

        let result = self.limiter.acquire(user);
        if result.allowed {
            debug!(user = %user, current = result.current, remaining = result.remaining, "Authorized");
            Decision::Allowed
        } else {
            warn!(user = %user, retry_after_ms = result.retry_after.as_millis() as u64, "Rate limit exceeded");
            Decision::DeniedRateLimited {
                retry_after: result.retry_after,
            }
        }
    }

    /// Whether the identity passes the allowlist
    #[must_use]
    pub fn is_allowlisted(&self, user: &UserId) -> bool {
        self.allowlist.contains(user)
    }

    /// Current usage as `(calls in window, max)`
    #[must_use]
    pub fn usage(&self, user: &UserId) -> (u32, u32) {
        self.limiter.usage(user)
    }

    /// Forget an identity's rate window
    pub fn reset(&self, user: &UserId) {
        self.limiter.reset(user);
    }

    /// Drop idle rate windows
    pub fn cleanup(&self) -> usize {
        self.limiter.cleanup()
    }

    /// The configured allowlist
    #[must_use]
    pub fn allowlist(&self) -> &AllowList {
        &self.allowlist
    }

    /// The rate limit configuration
    #[must_use]
    pub fn rate_limit(&self) -> &RateLimitConfig {
        self.limiter.config()
    }
}
