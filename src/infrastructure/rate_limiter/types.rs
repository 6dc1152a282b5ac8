//! Rate limiter types and core data structures

/// Endpoint class for rate limiting
/// Determines which limit profile applies to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// General API traffic
    Default,
    /// Authentication endpoints (sign-in machinery, token issue)
    Auth,
    /// Password reset requests - tightest limits
    PasswordReset,
    /// Save-only draft acknowledgments
    Draft,
}

impl EndpointClass {
    /// Get the class name for window keys and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Default => "default",
            EndpointClass::Auth => "auth",
            EndpointClass::PasswordReset => "password_reset",
            EndpointClass::Draft => "draft",
        }
    }
}

impl std::fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Maximum requests allowed in the current window
    pub limit: u32,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Unix timestamp in milliseconds when the window resets
    pub reset_at_ms: u64,
    /// Retry-After duration in seconds (only set when blocked)
    pub retry_after_secs: Option<u64>,
    /// The endpoint class that was applied
    pub class: EndpointClass,
}

impl RateLimitDecision {
    /// Create a new allowed decision
    pub fn allowed(limit: u32, remaining: u32, reset_at_ms: u64, class: EndpointClass) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_at_ms,
            retry_after_secs: None,
            class,
        }
    }

    /// Create a new blocked decision
    pub fn blocked(limit: u32, reset_at_ms: u64, retry_after_secs: u64, class: EndpointClass) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at_ms,
            retry_after_secs: Some(retry_after_secs),
            class,
        }
    }

    /// Window reset as Unix seconds, for the `ratelimit-reset` header
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_class_names() {
        assert_eq!(EndpointClass::Default.as_str(), "default");
        assert_eq!(EndpointClass::Auth.as_str(), "auth");
        assert_eq!(EndpointClass::PasswordReset.as_str(), "password_reset");
        assert_eq!(EndpointClass::Draft.as_str(), "draft");
    }

    #[test]
    fn allowed_decision_has_no_retry_after() {
        let decision = RateLimitDecision::allowed(60, 59, 1_234_567_000, EndpointClass::Default);
        assert!(decision.allowed);
        assert_eq!(decision.limit, 60);
        assert_eq!(decision.remaining, 59);
        assert!(decision.retry_after_secs.is_none());
    }

    #[test]
    fn blocked_decision_exposes_retry_after() {
        let decision = RateLimitDecision::blocked(10, 1_234_567_000, 42, EndpointClass::Auth);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.retry_after_secs, Some(42));
        assert_eq!(decision.reset_at_secs(), 1_234_567);
    }
}
