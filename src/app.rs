//! Application setup and wiring

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::domain::submission::ISubmissionSink;
use crate::infrastructure::auth::{CsrfTokens, SessionService};
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::infrastructure::submission::InMemorySink;
use crate::presentation::controllers::GatewayState;
use crate::presentation::gate::RouteGate;
use crate::presentation::routes::create_router;

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Wire the gateway: clock, limiter (plus its sweep task), CSRF service,
/// session codec, route gate, submission sink, and the router on top.
///
/// Must run inside a tokio runtime; the limiter's sweep task is spawned
/// here and drains when the returned token is cancelled.
pub fn create_app(config: Config) -> AppHandle {
    create_app_with_sink(config, Arc::new(InMemorySink::new()))
}

/// Same wiring with an injected sink, for deployments composing a business
/// sink behind the gate and for tests that inspect accepted submissions.
pub fn create_app_with_sink(config: Config, sink: Arc<dyn ISubmissionSink>) -> AppHandle {
    let config = Arc::new(config);
    let shutdown_token = CancellationToken::new();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone(), clock));
    if config.rate_limit.enabled {
        limiter.clone().start_sweep_task(shutdown_token.clone());
    }

    let csrf = Arc::new(CsrfTokens::new());
    let sessions = SessionService::new(
        config.auth.session_secret.clone(),
        config.auth.session_ttl_hours,
    );
    let gate = Arc::new(RouteGate::marketplace());

    let state = GatewayState {
        sink,
        csrf,
        config: config.clone(),
    };

    let router = create_router(state, sessions, limiter, gate);

    AppHandle {
        router,
        shutdown_token,
    }
}
