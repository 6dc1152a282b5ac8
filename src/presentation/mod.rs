//! Presentation Layer - HTTP interface and route policy
//!
//! The route gate is a pure policy evaluator; the middleware module binds
//! it, the rate limiter, and the CSRF service to the axum request pipeline.

pub mod controllers;
pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod models;
pub mod routes;

pub use controllers::GatewayState;
pub use gate::{GateDecision, RouteGate};
pub use routes::create_router;
