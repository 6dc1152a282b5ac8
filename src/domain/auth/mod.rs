//! Authentication domain module
//!
//! Contains the marketplace roles, the decoded session claim consumed by the
//! route gate, and authentication errors.

pub mod errors;
pub mod value_objects;

pub use errors::*;
pub use value_objects::*;
