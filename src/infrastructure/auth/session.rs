//! Session claim codec
//!
//! Sessions travel as an HS256 JWT in the `session_token` cookie. Handlers
//! never see raw tokens, only decoded claims; the gate treats any decode
//! failure identically to an absent claim.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::domain::auth::{AuthError, Claim, Role, SessionClaims};

/// Name of the cookie carrying the session claim
pub const SESSION_COOKIE: &str = "session_token";

/// Service for issuing and decoding session claims
#[derive(Clone)]
pub struct SessionService {
    /// Secret key for signing claims
    secret: Arc<String>,
    /// Session TTL in hours
    session_ttl_hours: u64,
}

impl SessionService {
    pub fn new(secret: String, session_ttl_hours: u64) -> Self {
        Self {
            secret: Arc::new(secret),
            session_ttl_hours,
        }
    }

    /// Issue a signed session token for an account
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.session_ttl_hours as i64);

        let claims = SessionClaims::new(
            subject,
            role,
            exp.timestamp() as usize,
            now.timestamp() as usize,
        );

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::default(), &claims, &encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {}", e);
            AuthError::InvalidToken
        })
    }

    /// Decode and verify a session token into a claim
    pub fn decode(&self, token: &str) -> Result<Claim, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let claims = decode::<SessionClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Session token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        let role = Role::from_str(&claims.role).map_err(|_| AuthError::UnknownRole {
            role: claims.role.clone(),
        })?;

        Ok(Claim {
            subject: claims.sub,
            role,
        })
    }
}
