//! Configuration management for the auth server
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

use crate::auth::DEFAULT_NONCE_TTL_SECONDS;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";
const DEV_REFRESH_TOKEN_SECRET: &str = "development-refresh-secret-change-in-production";

/// Longest accepted challenge lifetime
pub const MAX_NONCE_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Database connection URL; in-memory user directory when unset
    pub database_url: Option<String>,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Rate limit on `/auth/*`: requests per second per client IP
    pub rate_limit_rps: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Secret for signing access tokens
    pub jwt_secret: String,

    /// Access token TTL in seconds (default: 900 = 15 minutes)
    pub jwt_access_token_ttl_seconds: i64,

    /// Secret for signing refresh tokens
    pub refresh_token_secret: String,

    /// Refresh token TTL in days (default: 7)
    pub refresh_token_ttl_days: i64,

    /// Auth nonce TTL in seconds (default: 300 = 5 minutes)
    pub auth_nonce_ttl_seconds: i64,

    /// How often expired nonces are purged from memory
    pub nonce_sweep_interval_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5);

        let rate_limit_rps = parse_or(&lookup, "RATE_LIMIT_RPS", 10);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS");

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let jwt_access_token_ttl_seconds = parse_or(&lookup, "JWT_ACCESS_TOKEN_TTL_SECONDS", 900);

        let refresh_token_secret = lookup("REFRESH_TOKEN_SECRET")
            .unwrap_or_else(|| DEV_REFRESH_TOKEN_SECRET.to_string());

        let refresh_token_ttl_days = parse_or(&lookup, "REFRESH_TOKEN_TTL_DAYS", 7);

        let auth_nonce_ttl_seconds =
            parse_or(&lookup, "AUTH_NONCE_TTL_SECONDS", DEFAULT_NONCE_TTL_SECONDS);

        let nonce_sweep_interval_seconds = parse_or(&lookup, "NONCE_SWEEP_INTERVAL_SECONDS", 60);

        if !(1..=MAX_NONCE_TTL_SECONDS).contains(&auth_nonce_ttl_seconds) {
            return Err(ConfigError::InvalidValue(format!(
                "AUTH_NONCE_TTL_SECONDS must be between 1 and {}",
                MAX_NONCE_TTL_SECONDS
            )));
        }

        if rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_RPS must be positive".to_string(),
            ));
        }

        if nonce_sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "NONCE_SWEEP_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }

        if environment.is_production() {
            if jwt_secret == DEV_JWT_SECRET {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
            }
            if refresh_token_secret == DEV_REFRESH_TOKEN_SECRET {
                return Err(ConfigError::MissingEnvVar(
                    "REFRESH_TOKEN_SECRET".to_string(),
                ));
            }
        }

        Ok(Config {
            environment,
            host,
            port,
            log_level,
            database_url,
            db_max_connections,
            rate_limit_rps,
            cors_allowed_origins,
            jwt_secret,
            jwt_access_token_ttl_seconds,
            refresh_token_secret,
            refresh_token_ttl_days,
            auth_nonce_ttl_seconds,
            nonce_sweep_interval_seconds,
        })
    }

    /// Get database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> Option<String> {
        let url = self.database_url.as_ref()?;

        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return Some(format!("{}****{}", prefix, suffix));
            }
        }
        Some(url.clone())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}
