//! Route definitions and router assembly

use axum::http::StatusCode;
use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::auth::SessionService;
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::presentation::{
    controllers::{GatewayState, accept_submission, health_check, issue_csrf_token},
    gate::RouteGate,
    middleware::{
        CsrfState, GateState, RateLimiterState, csrf_validation_middleware, gate_middleware,
        logging_middleware, rate_limit_middleware, security_headers_middleware,
    },
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::health_check,
        crate::presentation::controllers::issue_csrf_token,
        crate::presentation::controllers::accept_submission,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CsrfTokenResponse,
            DraftAckResponse,
            crate::domain::submission::SubmissionReceipt,
            crate::domain::submission::FieldError,
            crate::domain::submission::FormKind,
            crate::domain::auth::Role,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "CSRF token issuance for the session-based auth flow"),
        (name = "submissions", description = "Draft-capable form submission endpoints")
    ),
    info(
        title = "Worklane Gateway API",
        version = "0.3.0",
        description = "Request gatekeeping edge for the Worklane marketplace: route policy, \
                       per-key rate limiting, CSRF protection, and the deferred-submission \
                       endpoints the client protocol drives.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the gateway router with the full middleware stack
pub fn create_router(
    state: GatewayState,
    sessions: SessionService,
    limiter: Arc<RateLimiter>,
    gate: Arc<RouteGate>,
) -> Router {
    let config = state.config.clone();

    let csrf_state = Arc::new(CsrfState::new(state.csrf.clone()));
    let gate_state = Arc::new(GateState::new(gate, sessions));
    let rate_limiter_state = Arc::new(RateLimiterState::new(limiter, config.rate_limit.enabled));

    // Submission endpoints are the only state-changing surface; CSRF guards
    // them, with the save-only exemption handled inside the middleware.
    let submission_routes = Router::new()
        .route("/submissions/{form_kind}", post(accept_submission))
        .layer(middleware::from_fn_with_state(
            csrf_state,
            csrf_validation_middleware,
        ));

    let auth_routes = Router::new().route("/auth/csrf", get(issue_csrf_token));

    let api_routes = Router::new().merge(submission_routes).merge(auth_routes);

    async fn root_handler() -> Response {
        axum::Json(serde_json::json!({
            "name": "Worklane Gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health",
                "api": "/api/v1",
                "docs": "/docs"
            }
        }))
        .into_response()
    }

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/", get(root_handler))
        .route("/health", get(health_check));

    // Avoid leaking interactive docs in hardened deployments.
    if config.server.enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.server.allowed_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_seconds),
        ))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(security_headers_middleware));

    // Layer order is reversed: the gate is added last so it runs first,
    // attaching the claim before the limiter counts the request.
    router
        .layer(middleware::from_fn_with_state(
            rate_limiter_state,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(gate_state, gate_middleware))
        .layer(service_builder)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// A single `*` means any origin without credentials; the session cookie
/// will not travel cross-origin in that mode. Specific origins enable
/// credentials so the cookie-based flow works from the marketplace front
/// end.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ];
    let headers = [
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
        axum::http::HeaderName::from_static("x-csrf-token"),
    ];

    if allowed_origins.len() == 1 && allowed_origins[0] == "*" {
        tracing::warn!(
            "CORS: wildcard origin configured; cookie authentication will not work cross-origin"
        );
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600))
    } else {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| {
                axum::http::HeaderValue::from_str(origin)
                    .map_err(|_| {
                        tracing::warn!(origin = %origin, "Invalid CORS origin in config; skipping");
                    })
                    .ok()
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    }
}
