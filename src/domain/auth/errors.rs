//! Authentication domain errors

use thiserror::Error;

/// Authentication-specific domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid token provided")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Unknown role in claim: {role}")]
    UnknownRole { role: String },
}
