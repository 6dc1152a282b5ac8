//! Submission domain module
//!
//! Contains the draft-capable form kinds, local field validation, the
//! submission receipt, and the sink trait the gateway hands accepted
//! submissions to.

pub mod errors;
pub mod repositories;
pub mod validation;
pub mod value_objects;

pub use errors::*;
pub use repositories::*;
pub use validation::*;
pub use value_objects::*;
