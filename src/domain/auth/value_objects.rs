//! Authentication value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marketplace role enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A talent account: job seekers managing profiles and applications
    Talent,
    /// An employer account: companies managing job listings
    Employer,
}

impl Role {
    /// Get all available roles
    pub fn all() -> Vec<Role> {
        vec![Role::Talent, Role::Employer]
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "talent" => Ok(Role::Talent),
            "employer" => Ok(Role::Employer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Talent => write!(f, "talent"),
            Role::Employer => write!(f, "employer"),
        }
    }
}

/// Decoded authentication claim attached to a request.
///
/// A claim exists only when the session cookie decoded successfully; any
/// decoding failure upstream is treated identically to an absent claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Subject (account id)
    pub subject: String,
    pub role: Role,
}

impl Claim {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

/// Signed session claims carried by the session cookie (JWT payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account id)
    pub sub: String,
    /// Marketplace role, lowercase
    pub role: String,
    /// Expiration timestamp (Unix time)
    pub exp: usize,
    /// Issued at timestamp (Unix time)
    pub iat: usize,
}

impl SessionClaims {
    pub fn new(subject: &str, role: Role, exp: usize, iat: usize) -> Self {
        Self {
            sub: subject.to_string(),
            role: role.to_string(),
            exp,
            iat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::all() {
            let parsed: Role = role.to_string().parse().expect("role should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("admin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::from_str("Employer"), Ok(Role::Employer));
        assert_eq!(Role::from_str("TALENT"), Ok(Role::Talent));
    }
}
