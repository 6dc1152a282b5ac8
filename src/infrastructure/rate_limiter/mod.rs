//! Fixed-window rate limiting
//!
//! Per-key request counters with one limit profile per endpoint class.
//! Counters are process-local, so a multi-instance deployment rate-limits
//! per instance.

pub mod service;
pub mod types;

pub use service::RateLimiter;
pub use types::{EndpointClass, RateLimitDecision};
