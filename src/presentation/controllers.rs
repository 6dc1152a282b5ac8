//! HTTP handlers for the gateway surface

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::submission::{FormKind, ISubmissionSink};
use crate::infrastructure::auth::CsrfTokens;
use crate::presentation::extractors::MaybeClaim;
use crate::presentation::models::{
    CsrfTokenResponse, DraftAckResponse, ErrorResponse, HealthResponse,
};

/// Shared state for gateway handlers
#[derive(Clone)]
pub struct GatewayState {
    pub sink: Arc<dyn ISubmissionSink>,
    pub csrf: Arc<CsrfTokens>,
    pub config: Arc<Config>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Issue a CSRF token bound to the process secret
#[utoipa::path(
    get,
    path = "/api/v1/auth/csrf",
    tag = "auth",
    responses(
        (status = 200, description = "Fresh CSRF token", body = CsrfTokenResponse)
    )
)]
pub async fn issue_csrf_token(State(state): State<GatewayState>) -> Json<CsrfTokenResponse> {
    Json(CsrfTokenResponse {
        csrf_token: state.csrf.generate_token(),
    })
}

/// Query parameters accepted by the submission endpoint
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SubmissionQuery {
    /// When set ("true" or "1"), acknowledge the draft without performing
    /// the authenticated side effect
    pub save_only: Option<String>,
    /// Entity being edited, if any; part of the draft key
    pub entity_id: Option<i64>,
}

impl SubmissionQuery {
    fn is_save_only(&self) -> bool {
        matches!(self.save_only.as_deref(), Some("true") | Some("1"))
    }
}

/// Accept a form submission, or acknowledge a draft in save-only mode
#[utoipa::path(
    post,
    path = "/api/v1/submissions/{form_kind}",
    tag = "submissions",
    params(
        ("form_kind" = String, Path, description = "Draft-capable form kind", example = "job_listing"),
        SubmissionQuery
    ),
    responses(
        (status = 200, description = "Submission accepted, or draft acknowledged in save-only mode"),
        (status = 401, description = "No valid session claim", body = ErrorResponse),
        (status = 403, description = "CSRF token missing or invalid", body = ErrorResponse),
        (status = 404, description = "Unknown form kind", body = ErrorResponse),
        (status = 502, description = "Submission sink unavailable", body = ErrorResponse)
    )
)]
pub async fn accept_submission(
    State(state): State<GatewayState>,
    Path(form_kind): Path<String>,
    Query(query): Query<SubmissionQuery>,
    MaybeClaim(claim): MaybeClaim,
    Json(payload): Json<serde_json::Value>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let form_kind = FormKind::from_str(&form_kind).map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "UNKNOWN_FORM_KIND",
                format!("No such form kind: {}", form_kind),
            )),
        )
    })?;

    // Save-only calls acknowledge the draft and stop; the gate and CSRF
    // layers have already let them through without a claim.
    if query.is_save_only() {
        let draft_key = form_kind.draft_key(query.entity_id);
        tracing::debug!(draft_key = %draft_key, "Acknowledged save-only draft");
        return Ok(Json(DraftAckResponse::new(draft_key)).into_response());
    }

    let claim = claim.ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "UNAUTHENTICATED",
                "Authentication required",
            )),
        )
    })?;

    let receipt = state
        .sink
        .accept(form_kind, query.entity_id, &claim, payload)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, form = form_kind.as_str(), "Submission sink failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(
                    "SUBMISSION_FAILED",
                    "Could not complete the submission; please retry",
                )),
            )
        })?;

    Ok(Json(receipt).into_response())
}
