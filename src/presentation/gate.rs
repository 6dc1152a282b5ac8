//! Route gate - the ordered routing policy
//!
//! Every inbound request passes through one synchronous gate decision before
//! it reaches business logic. The gate is a pure function over an ordered
//! policy table: no I/O, no clock, no side effects, which keeps the
//! precedence rules auditable and testable without any HTTP machinery.

use axum::http::Method;

use crate::domain::auth::{Claim, Role};

/// What a matched policy demands of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// No claim needed
    Public,
    /// Draft-capable submission endpoint: save-only requests pass without a
    /// claim, everything else needs one
    SaveOnlyExempt,
    /// Any valid claim
    AuthenticatedAny,
    /// A claim carrying this specific role
    AuthenticatedRole(Role),
}

/// Path predicate for a policy row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatcher {
    /// Matches the path exactly
    Exact(&'static str),
    /// Matches the path and everything below it
    Prefix(&'static str),
    /// Matches `/jobs/{numeric id}` for read methods only; a write to a
    /// detail path falls through to later rows
    ListingDetail,
}

impl PathMatcher {
    fn matches(&self, path: &str, method: &Method) -> bool {
        match self {
            PathMatcher::Exact(expected) => path == *expected,
            PathMatcher::Prefix(prefix) => {
                path == prefix.trim_end_matches('/') || path.starts_with(prefix)
            }
            PathMatcher::ListingDetail => {
                if !matches!(*method, Method::GET | Method::HEAD) {
                    return false;
                }
                match path.strip_prefix("/jobs/") {
                    Some(id) => !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()),
                    None => false,
                }
            }
        }
    }
}

/// One row of the ordered policy table
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    pub matcher: PathMatcher,
    pub requirement: Requirement,
}

impl RoutePolicy {
    pub const fn new(matcher: PathMatcher, requirement: Requirement) -> Self {
        Self {
            matcher,
            requirement,
        }
    }
}

/// Outcome of a gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Send the visitor to sign-in, preserving where they were headed
    RedirectToSignIn { return_to: String },
    /// Authenticated but not allowed here; sign-in would not help
    RedirectToAccessDenied,
}

/// Ordered first-match route policy evaluator
pub struct RouteGate {
    policies: Vec<RoutePolicy>,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self::marketplace()
    }
}

impl RouteGate {
    pub fn new(policies: Vec<RoutePolicy>) -> Self {
        Self { policies }
    }

    /// The marketplace policy table. Order is load-bearing: public rows
    /// first, then the detail-view pattern, then the draft-capable
    /// submission endpoints, then role-scoped subtrees, and a catch-all
    /// that requires a claim for everything else.
    pub fn marketplace() -> Self {
        use PathMatcher::*;
        use Requirement::*;

        Self::new(vec![
            RoutePolicy::new(Exact("/"), Public),
            RoutePolicy::new(Exact("/auth/signin"), Public),
            RoutePolicy::new(Exact("/auth/signup"), Public),
            RoutePolicy::new(Exact("/auth/error"), Public),
            RoutePolicy::new(Exact("/access-denied"), Public),
            RoutePolicy::new(Exact("/jobs"), Public),
            RoutePolicy::new(Exact("/health"), Public),
            RoutePolicy::new(Prefix("/docs"), Public),
            RoutePolicy::new(Prefix("/api-docs"), Public),
            RoutePolicy::new(Prefix("/api/v1/auth/"), Public),
            RoutePolicy::new(ListingDetail, Public),
            RoutePolicy::new(Prefix("/api/v1/submissions"), SaveOnlyExempt),
            RoutePolicy::new(Prefix("/employer"), AuthenticatedRole(Role::Employer)),
            RoutePolicy::new(Prefix("/talent"), AuthenticatedRole(Role::Talent)),
            RoutePolicy::new(Prefix("/"), AuthenticatedAny),
        ])
    }

    /// Evaluate the policy table top to bottom for one request.
    ///
    /// `target` is the original path plus query; matching runs against the
    /// path portion only, the full target becomes the sign-in return path.
    /// Claim decoding failures upstream must arrive here as `claim = None`.
    pub fn evaluate(
        &self,
        target: &str,
        method: &Method,
        save_only: bool,
        claim: Option<&Claim>,
    ) -> GateDecision {
        let path = target.split('?').next().unwrap_or(target);

        let requirement = self
            .policies
            .iter()
            .find(|policy| policy.matcher.matches(path, method))
            .map(|policy| policy.requirement)
            .unwrap_or(Requirement::AuthenticatedAny);

        match requirement {
            Requirement::Public => GateDecision::Allow,
            Requirement::SaveOnlyExempt => {
                if save_only {
                    GateDecision::Allow
                } else {
                    Self::require_any(target, claim)
                }
            }
            Requirement::AuthenticatedAny => Self::require_any(target, claim),
            Requirement::AuthenticatedRole(required) => match claim {
                None => GateDecision::RedirectToSignIn {
                    return_to: target.to_string(),
                },
                Some(claim) if claim.role == required => GateDecision::Allow,
                Some(_) => GateDecision::RedirectToAccessDenied,
            },
        }
    }

    fn require_any(target: &str, claim: Option<&Claim>) -> GateDecision {
        match claim {
            Some(_) => GateDecision::Allow,
            None => GateDecision::RedirectToSignIn {
                return_to: target.to_string(),
            },
        }
    }
}

/// Sign-in redirect location for a gate decision, with the interrupted
/// target attached as `callbackUrl`.
pub fn sign_in_location(return_to: &str) -> String {
    format!("/auth/signin?callbackUrl={}", query_escape(return_to))
}

/// Location of the access-denied page
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

/// Percent-encode a string for use as a query parameter value.
///
/// Unreserved characters pass through; everything else, including `/`, `?`
/// and `&`, is escaped so the callback URL survives as a single value.
pub fn query_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                escaped.push(byte as char);
            }
            _ => escaped.push_str(&format!("%{:02X}", byte)),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> RouteGate {
        RouteGate::marketplace()
    }

    fn talent() -> Claim {
        Claim::new("acct_1", Role::Talent)
    }

    fn employer() -> Claim {
        Claim::new("acct_2", Role::Employer)
    }

    #[test]
    fn public_paths_allow_anonymous_visitors() {
        for path in ["/", "/auth/signin", "/auth/signup", "/auth/error", "/jobs"] {
            assert_eq!(
                gate().evaluate(path, &Method::GET, false, None),
                GateDecision::Allow,
                "expected {} to be public",
                path
            );
        }
    }

    #[test]
    fn listing_detail_views_are_public_for_reads() {
        assert_eq!(
            gate().evaluate("/jobs/42", &Method::GET, false, None),
            GateDecision::Allow
        );
        assert_eq!(
            gate().evaluate("/jobs/42", &Method::HEAD, false, None),
            GateDecision::Allow
        );
    }

    #[test]
    fn listing_detail_writes_fall_through_to_the_catch_all() {
        assert_eq!(
            gate().evaluate("/jobs/42", &Method::POST, false, None),
            GateDecision::RedirectToSignIn {
                return_to: "/jobs/42".to_string()
            }
        );
    }

    #[test]
    fn non_numeric_detail_paths_are_not_public() {
        assert!(matches!(
            gate().evaluate("/jobs/new", &Method::GET, false, None),
            GateDecision::RedirectToSignIn { .. }
        ));
        assert!(matches!(
            gate().evaluate("/jobs/42/edit", &Method::GET, false, None),
            GateDecision::RedirectToSignIn { .. }
        ));
    }

    #[test]
    fn save_only_submissions_bypass_authentication() {
        assert_eq!(
            gate().evaluate(
                "/api/v1/submissions/job_listing?save_only=true",
                &Method::POST,
                true,
                None
            ),
            GateDecision::Allow
        );
    }

    #[test]
    fn submissions_without_the_flag_require_a_claim() {
        let decision = gate().evaluate(
            "/api/v1/submissions/job_listing",
            &Method::POST,
            false,
            None,
        );
        assert_eq!(
            decision,
            GateDecision::RedirectToSignIn {
                return_to: "/api/v1/submissions/job_listing".to_string()
            }
        );

        assert_eq!(
            gate().evaluate(
                "/api/v1/submissions/job_listing",
                &Method::POST,
                false,
                Some(&employer())
            ),
            GateDecision::Allow
        );
    }

    #[test]
    fn wrong_role_is_access_denied_not_sign_in() {
        assert_eq!(
            gate().evaluate("/employer/dashboard", &Method::GET, false, Some(&talent())),
            GateDecision::RedirectToAccessDenied
        );
        assert_eq!(
            gate().evaluate("/talent/profile", &Method::GET, false, Some(&employer())),
            GateDecision::RedirectToAccessDenied
        );
    }

    #[test]
    fn matching_role_is_allowed() {
        assert_eq!(
            gate().evaluate(
                "/employer/dashboard",
                &Method::GET,
                false,
                Some(&employer())
            ),
            GateDecision::Allow
        );
    }

    #[test]
    fn role_subtree_without_claim_redirects_to_sign_in() {
        assert_eq!(
            gate().evaluate("/employer/dashboard?tab=open", &Method::GET, false, None),
            GateDecision::RedirectToSignIn {
                return_to: "/employer/dashboard?tab=open".to_string()
            }
        );
    }

    #[test]
    fn unknown_paths_require_a_claim() {
        assert!(matches!(
            gate().evaluate("/settings", &Method::GET, false, None),
            GateDecision::RedirectToSignIn { .. }
        ));
        assert_eq!(
            gate().evaluate("/settings", &Method::GET, false, Some(&talent())),
            GateDecision::Allow
        );
    }

    #[test]
    fn return_target_preserves_the_query_string() {
        let decision = gate().evaluate("/settings?section=billing", &Method::GET, false, None);
        assert_eq!(
            decision,
            GateDecision::RedirectToSignIn {
                return_to: "/settings?section=billing".to_string()
            }
        );
    }

    #[test]
    fn sign_in_location_escapes_the_callback() {
        assert_eq!(
            sign_in_location("/jobs/new?resume=job_listing"),
            "/auth/signin?callbackUrl=%2Fjobs%2Fnew%3Fresume%3Djob_listing"
        );
    }
}
