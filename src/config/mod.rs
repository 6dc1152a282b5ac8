//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI). Should be false in hardened production.
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_docs: true,
            request_timeout_seconds: 30,
            allowed_origins: vec![],
        }
    }
}

/// Session authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for session claims. Override in production.
    pub session_secret: String,
    /// Lifetime of issued session claims in hours.
    pub session_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: "dev-session-secret-change-me-before-deploy".to_string(),
            session_ttl_hours: 24,
        }
    }
}

/// Fixed-window rate limiting configuration, one profile per endpoint class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled
    pub enabled: bool,
    /// Interval between sweeps of stale window counters, in seconds
    pub sweep_interval_seconds: u64,
    pub default: RateLimitProfileConfig,
    pub auth: RateLimitProfileConfig,
    pub password_reset: RateLimitProfileConfig,
    pub draft: RateLimitProfileConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: 300,
            default: RateLimitProfileConfig::new(60, 60_000, "Too many requests, slow down."),
            auth: RateLimitProfileConfig::new(10, 60_000, "Too many authentication attempts."),
            password_reset: RateLimitProfileConfig::new(
                3,
                900_000,
                "Too many password reset requests.",
            ),
            draft: RateLimitProfileConfig::new(30, 60_000, "Too many draft saves."),
        }
    }
}

/// Limit profile for one endpoint class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitProfileConfig {
    /// Requests allowed per window
    pub limit: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Message returned to callers when the limit is hit
    pub message: String,
}

impl RateLimitProfileConfig {
    pub fn new(limit: u32, window_ms: u64, message: &str) -> Self {
        Self {
            limit,
            window_ms,
            message: message.to_string(),
        }
    }
}

impl Default for RateLimitProfileConfig {
    fn default() -> Self {
        Self::new(60, 60_000, "Too many requests, slow down.")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Add local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WORKLANE").separator("__"));

        let mut config: Config = builder.build()?.try_deserialize()?;

        // Override session secret from SESSION_SECRET env var if present (common convention)
        if let Ok(session_secret) = std::env::var("SESSION_SECRET") {
            config.auth.session_secret = session_secret;
        }

        // Validate the loaded configuration
        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
