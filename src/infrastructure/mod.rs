//! Infrastructure Layer - concrete services behind the domain ports

pub mod auth;
pub mod clock;
pub mod rate_limiter;
pub mod submission;
