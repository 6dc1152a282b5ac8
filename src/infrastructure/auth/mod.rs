//! Authentication infrastructure
//!
//! CSRF token issuance/verification and the session claim codec.

pub mod csrf;
pub mod session;

pub use csrf::CsrfTokens;
pub use session::{SESSION_COOKIE, SessionService};
