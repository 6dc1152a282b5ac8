//! Configuration validation module

use crate::config::{AuthConfig, Config, RateLimitConfig, RateLimitProfileConfig, ServerConfig};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Authentication configuration error: {message}")]
    Auth { message: String },

    #[error("Rate limit configuration error: {message}")]
    RateLimit { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::server("port must be non-zero"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "request_timeout_seconds must be > 0",
            ));
        }
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ValidationError::server(
                "allowed_origins entries must be non-empty",
            ));
        }
        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.session_secret.len() < 32 {
            return Err(ValidationError::auth(
                "session_secret must be at least 32 characters",
            ));
        }
        if self.session_ttl_hours == 0 {
            return Err(ValidationError::auth("session_ttl_hours must be > 0"));
        }
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.sweep_interval_seconds == 0 {
            return Err(ValidationError::rate_limit(
                "sweep_interval_seconds must be > 0",
            ));
        }
        for (name, profile) in [
            ("default", &self.default),
            ("auth", &self.auth),
            ("password_reset", &self.password_reset),
            ("draft", &self.draft),
        ] {
            validate_profile(name, profile)?;
        }
        Ok(())
    }
}

fn validate_profile(
    name: &str,
    profile: &RateLimitProfileConfig,
) -> Result<(), ValidationError> {
    if profile.limit == 0 {
        return Err(ValidationError::rate_limit(format!(
            "{} profile limit must be > 0",
            name
        )));
    }
    if profile.window_ms == 0 {
        return Err(ValidationError::rate_limit(format!(
            "{} profile window_ms must be > 0",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_window() {
        let mut config = Config::default();
        config.rate_limit.auth.window_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::RateLimit { .. })
        ));
    }

    #[test]
    fn rejects_short_session_secret() {
        let mut config = Config::default();
        config.auth.session_secret = "short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Auth { .. })
        ));
    }
}
