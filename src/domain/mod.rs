//! Domain Layer - core types of the gatekeeping and submission protocol
//!
//! This module contains the value objects, errors, and port traits shared by
//! the server-side gate and the client-side submission protocol.

pub mod auth;
pub mod submission;

pub use auth::*;
pub use submission::*;
