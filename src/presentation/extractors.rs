//! Claim extractors for axum handlers
//!
//! The gate middleware decodes the session cookie once per request and
//! parks the outcome in request extensions; handlers pull it out through
//! these extractors instead of touching cookies themselves.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use std::convert::Infallible;

use crate::domain::auth::Claim;
use crate::presentation::models::ErrorResponse;

/// The decoded claim for this request, if any.
///
/// Inserted by the gate middleware; a decoding failure upstream shows up
/// here as `None`, identical to an absent cookie.
#[derive(Debug, Clone, Default)]
pub struct MaybeClaim(pub Option<Claim>);

impl<S> FromRequestParts<S> for MaybeClaim
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<MaybeClaim>().cloned().unwrap_or_default())
    }
}

/// A required claim; rejects with 401 when the request has none.
///
/// The gate already redirects or rejects unauthenticated traffic before
/// handlers run, so this firing means a route was wired outside the policy
/// table; the extractor keeps that mistake a 401 instead of a panic.
#[derive(Debug, Clone)]
pub struct AuthClaim(pub Claim);

impl<S> FromRequestParts<S> for AuthClaim
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<MaybeClaim>() {
            Some(MaybeClaim(Some(claim))) => Ok(AuthClaim(claim.clone())),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "UNAUTHENTICATED",
                    "Authentication required",
                )),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::Role;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    fn parts_with(claim: Option<MaybeClaim>) -> Parts {
        let mut request = Request::builder().uri("/settings").body(()).unwrap();
        if let Some(claim) = claim {
            request.extensions_mut().insert(claim);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn maybe_claim_defaults_to_none_without_the_extension() {
        let mut parts = parts_with(None);
        let MaybeClaim(claim) = MaybeClaim::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(claim.is_none());
    }

    #[tokio::test]
    async fn auth_claim_extracts_the_decoded_claim() {
        let claim = Claim::new("acct_9", Role::Employer);
        let mut parts = parts_with(Some(MaybeClaim(Some(claim.clone()))));

        let AuthClaim(extracted) = AuthClaim::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, claim);
    }

    #[tokio::test]
    async fn auth_claim_rejects_anonymous_requests() {
        let mut parts = parts_with(Some(MaybeClaim(None)));

        let (status, Json(body)) = AuthClaim::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "UNAUTHENTICATED");
    }
}
