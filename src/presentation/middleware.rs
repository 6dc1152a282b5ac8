//! HTTP middleware for the gateway
//!
//! Order matters: the gate middleware runs first and attaches the decoded
//! claim, the rate limiter counts the request, and CSRF validation guards
//! the state-changing routes it is layered onto.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Redirect, Response},
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::infrastructure::auth::{CsrfTokens, SESSION_COOKIE, SessionService};
use crate::infrastructure::rate_limiter::{EndpointClass, RateLimiter};
use crate::presentation::extractors::MaybeClaim;
use crate::presentation::gate::{ACCESS_DENIED_PATH, GateDecision, RouteGate, sign_in_location};
use crate::presentation::models::ErrorResponse;

/// Build a JSON error response with the standard envelope
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

/// Stable client identity for rate limiting: the first forwarded address,
/// the direct peer header, or a sentinel when neither is present.
pub fn extract_client_key(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "unknown-ip".to_string())
}

/// Extract a cookie value from request headers
fn extract_cookie(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(axum::http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                cookie
                    .trim()
                    .strip_prefix(&format!("{}=", name))
                    .map(|value| value.to_string())
            })
        })
}

/// Whether the request carries the save-only flag in its query string
pub fn is_save_only(query: Option<&str>) -> bool {
    query
        .unwrap_or("")
        .split('&')
        .any(|pair| pair == "save_only=true" || pair == "save_only=1")
}

/// Map a path to its rate limit profile.
///
/// Save-only submission calls get the draft profile: unauthenticated but
/// cheap, so they sit between the auth and default limits.
pub fn classify_endpoint(path: &str, save_only: bool) -> EndpointClass {
    if path.starts_with("/api/v1/auth/password-reset") {
        EndpointClass::PasswordReset
    } else if path.starts_with("/api/v1/auth") {
        EndpointClass::Auth
    } else if path.starts_with("/api/v1/submissions") && save_only {
        EndpointClass::Draft
    } else {
        EndpointClass::Default
    }
}

// ============================================================================
// Gate middleware
// ============================================================================

/// Shared state for the gate middleware
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RouteGate>,
    pub sessions: SessionService,
}

impl GateState {
    pub fn new(gate: Arc<RouteGate>, sessions: SessionService) -> Self {
        Self { gate, sessions }
    }
}

/// Route gate middleware
///
/// Decodes the session cookie once, attaches the claim (or its absence) to
/// the request, and enforces the gate decision. API paths get JSON errors;
/// page paths get redirects so the browser lands on sign-in with a
/// `callbackUrl` pointing back at the interruption.
pub async fn gate_middleware(
    State(state): State<Arc<GateState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let path = request.uri().path().to_string();
    let save_only = is_save_only(request.uri().query());

    // Decoding failures are indistinguishable from an absent cookie.
    let claim = extract_cookie(request.headers(), SESSION_COOKIE)
        .and_then(|token| match state.sessions.decode(&token) {
            Ok(claim) => Some(claim),
            Err(e) => {
                tracing::debug!(error = %e, "Session cookie rejected, treating as anonymous");
                None
            }
        });

    let decision = state.gate.evaluate(&target, &method, save_only, claim.as_ref());
    request.extensions_mut().insert(MaybeClaim(claim));

    match decision {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToSignIn { return_to } => {
            if path.starts_with("/api/") {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "Authentication required",
                )
            } else {
                Redirect::to(&sign_in_location(&return_to)).into_response()
            }
        }
        GateDecision::RedirectToAccessDenied => {
            if path.starts_with("/api/") {
                error_response(
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN_ROLE",
                    "Your role does not allow this",
                )
            } else {
                Redirect::to(ACCESS_DENIED_PATH).into_response()
            }
        }
    }
}

// ============================================================================
// Rate limiting middleware
// ============================================================================

/// Shared state for rate limiting middleware
#[derive(Clone)]
pub struct RateLimiterState {
    pub service: Arc<RateLimiter>,
    pub enabled: bool,
}

impl RateLimiterState {
    pub fn new(service: Arc<RateLimiter>, enabled: bool) -> Self {
        Self { service, enabled }
    }
}

/// Paths exempt from rate limiting
const RATE_LIMIT_EXCLUDED_PATHS: &[&str] = &["/health", "/docs", "/api-docs", "/favicon.ico"];

fn should_skip_rate_limit(path: &str) -> bool {
    !path.starts_with("/api/")
        || RATE_LIMIT_EXCLUDED_PATHS
            .iter()
            .any(|excluded| path.starts_with(excluded))
}

/// Add IETF draft standard rate limit headers to a response
fn add_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset_at_secs: u64) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
    if let Ok(val) = HeaderValue::from_str(&reset_at_secs.to_string()) {
        headers.insert("ratelimit-reset", val);
    }
}

/// Rate limiting middleware over the fixed-window limiter.
///
/// Applies to API traffic only; the limiter itself fails open, so this
/// layer can deny a request solely on a counted decision.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    if should_skip_rate_limit(&path) {
        return next.run(request).await;
    }

    let save_only = is_save_only(request.uri().query());
    let class = classify_endpoint(&path, save_only);
    let client_key = extract_client_key(request.headers());

    let decision = state.service.check(class, &client_key);

    if decision.allowed {
        let mut response = next.run(request).await;
        add_rate_limit_headers(
            &mut response,
            decision.limit,
            decision.remaining,
            decision.reset_at_secs(),
        );
        response
    } else {
        let retry_after = decision.retry_after_secs.unwrap_or(60);
        let message = state.service.profile(class).message.clone();

        tracing::warn!(
            client_key = %client_key,
            class = %class,
            retry_after,
            "Rate limit exceeded"
        );

        let body = ErrorResponse::new("RATE_LIMITED", message).with_details(serde_json::json!({
            "retry_after": retry_after,
            "limit": decision.limit,
        }));
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

        add_rate_limit_headers(&mut response, decision.limit, 0, decision.reset_at_secs());
        if let Ok(val) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("retry-after", val);
        }

        response
    }
}

// ============================================================================
// CSRF middleware
// ============================================================================

/// Shared state for CSRF validation middleware
#[derive(Clone)]
pub struct CsrfState {
    pub service: Arc<CsrfTokens>,
}

impl CsrfState {
    pub fn new(service: Arc<CsrfTokens>) -> Self {
        Self { service }
    }
}

/// CSRF validation middleware for state-changing requests.
///
/// Safe methods pass untouched. Save-only submission calls are exempt so
/// anonymous drafting works. Everything else must carry a verifiable token
/// in `x-csrf-token`; the two failure modes produce distinct messages.
pub async fn csrf_validation_middleware(
    State(state): State<Arc<CsrfState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();

    if matches!(
        method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    ) {
        return next.run(request).await;
    }

    if is_save_only(request.uri().query()) {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get("x-csrf-token")
        .and_then(|h| h.to_str().ok());

    match header_token {
        None => {
            tracing::warn!(
                method = %method,
                uri = %request.uri(),
                "CSRF validation failed: missing token header"
            );
            error_response(StatusCode::FORBIDDEN, "CSRF_MISSING", "CSRF token is missing")
        }
        Some(token) if !state.service.verify_token(token) => {
            tracing::warn!(
                method = %method,
                uri = %request.uri(),
                "CSRF validation failed: token did not verify"
            );
            error_response(StatusCode::FORBIDDEN, "CSRF_INVALID", "Invalid CSRF token")
        }
        Some(_) => next.run(request).await,
    }
}

// ============================================================================
// Security headers and request logging
// ============================================================================

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api/");
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    if is_api {
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }

    response
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn client_key_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(extract_client_key(&headers), "203.0.113.9");
    }

    #[test]
    fn client_key_falls_back_to_real_ip_then_sentinel() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(extract_client_key(&headers), "10.0.0.2");

        assert_eq!(extract_client_key(&HeaderMap::new()), "unknown-ip");
    }

    #[test]
    fn save_only_flag_parses_from_the_query() {
        assert!(is_save_only(Some("save_only=true")));
        assert!(is_save_only(Some("entity_id=4&save_only=1")));
        assert!(!is_save_only(Some("save_only=false")));
        assert!(!is_save_only(Some("entity_id=4")));
        assert!(!is_save_only(None));
    }

    #[test]
    fn endpoint_classification_is_most_specific_first() {
        assert_eq!(
            classify_endpoint("/api/v1/auth/password-reset", false),
            EndpointClass::PasswordReset
        );
        assert_eq!(
            classify_endpoint("/api/v1/auth/csrf", false),
            EndpointClass::Auth
        );
        assert_eq!(
            classify_endpoint("/api/v1/submissions/job_listing", true),
            EndpointClass::Draft
        );
        assert_eq!(
            classify_endpoint("/api/v1/submissions/job_listing", false),
            EndpointClass::Default
        );
        assert_eq!(classify_endpoint("/api/v1/other", false), EndpointClass::Default);
    }

    #[test]
    fn rate_limit_scope_is_api_traffic_only() {
        assert!(should_skip_rate_limit("/"));
        assert!(should_skip_rate_limit("/health"));
        assert!(should_skip_rate_limit("/jobs/42"));
        assert!(!should_skip_rate_limit("/api/v1/submissions/job_listing"));
    }
}
