//! Shared fixtures for gateway integration tests

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;

use worklane::config::Config;
use worklane::domain::auth::Role;
use worklane::infrastructure::auth::{CsrfTokens, SESSION_COOKIE, SessionService};
use worklane::infrastructure::clock::SystemClock;
use worklane::infrastructure::rate_limiter::RateLimiter;
use worklane::infrastructure::submission::InMemorySink;
use worklane::presentation::gate::RouteGate;
use worklane::presentation::{GatewayState, create_router};

/// A wired gateway with handles on the pieces tests inspect
pub struct Gateway {
    pub router: Router,
    pub sink: Arc<InMemorySink>,
    pub csrf: Arc<CsrfTokens>,
    pub sessions: SessionService,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.enable_docs = false;
    config
}

/// Build a gateway router the way `create_app` does, keeping the sink and
/// services reachable for assertions.
pub fn build_gateway(config: Config) -> Gateway {
    let sink = Arc::new(InMemorySink::new());
    let csrf = Arc::new(CsrfTokens::new());
    let sessions = SessionService::new(
        config.auth.session_secret.clone(),
        config.auth.session_ttl_hours,
    );
    let config = Arc::new(config);

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.clone(),
        Arc::new(SystemClock),
    ));
    let gate = Arc::new(RouteGate::marketplace());

    let state = GatewayState {
        sink: sink.clone(),
        csrf: csrf.clone(),
        config,
    };

    let router = create_router(state, sessions.clone(), limiter, gate);

    Gateway {
        router,
        sink,
        csrf,
        sessions,
    }
}

/// Cookie header value carrying a freshly issued session claim
pub fn session_cookie(gateway: &Gateway, subject: &str, role: Role) -> String {
    let token = gateway
        .sessions
        .issue(subject, role)
        .expect("issuing a session token should succeed");
    format!("{}={}", SESSION_COOKIE, token)
}

/// GET request with no body
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// POST request builder with the JSON content type preset; callers attach
/// the body and any cookie or CSRF headers
pub fn post_json(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
}

/// Decode a response body as JSON
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
