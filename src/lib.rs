//! Worklane gateway - request gatekeeping and deferred submission
//!
//! The edge subsystem of the Worklane marketplace: route policy, per-key
//! fixed-window rate limiting, and CSRF protection on the server side,
//! plus the client protocol (draft store and deferred-submission
//! orchestrator) that lets an anonymous visitor finish a form after a
//! forced sign-in detour without losing data.

pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use app::{AppHandle, create_app, create_app_with_sink};
pub use config::Config;
pub use logging::init_tracing;
