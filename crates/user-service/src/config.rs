use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default bind address (the port the original gateway listened on).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3456";

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Default token validity window (60 days).
pub const DEFAULT_TOKEN_VALIDITY_DAYS: i64 = 60;

/// Upper bound on the token validity window (10 years).
pub const MAX_TOKEN_VALIDITY_DAYS: i64 = 3650;

/// Default token resolution cache window (1 hour).
pub const DEFAULT_TOKEN_CACHE_TTL_SECONDS: u64 = 3600;

/// Default token resolution cache capacity.
pub const DEFAULT_TOKEN_CACHE_CAPACITY: usize = 10_000;

/// Bcrypt cost bounds. Below 10 is too weak, above 14 is too slow for login.
pub const MIN_BCRYPT_COST: u32 = 10;
pub const MAX_BCRYPT_COST: u32 = 14;
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Default graceful shutdown drain period (none).
pub const DEFAULT_DRAIN_SECONDS: u64 = 0;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub jwt_secret: SecretString,
    /// `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    pub token_validity_days: i64,
    pub token_cache_ttl: Duration,
    pub token_cache_capacity: usize,
    pub bcrypt_cost: u32,
    pub log_format: LogFormat,
    /// Wait after a shutdown signal before the listener stops.
    pub drain_period: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_JWT_SECRET_BYTES,
                jwt_secret.len()
            )));
        }
        let jwt_secret = SecretString::from(jwt_secret.clone());

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| SecretString::from(url.clone()));

        let token_validity_days =
            parse_or_default(vars, "TOKEN_VALIDITY_DAYS", DEFAULT_TOKEN_VALIDITY_DAYS)?;
        if !(1..=MAX_TOKEN_VALIDITY_DAYS).contains(&token_validity_days) {
            return Err(invalid(
                "TOKEN_VALIDITY_DAYS",
                &format!("must be between 1 and {}", MAX_TOKEN_VALIDITY_DAYS),
            ));
        }

        let token_cache_ttl_seconds = parse_or_default(
            vars,
            "TOKEN_CACHE_TTL_SECONDS",
            DEFAULT_TOKEN_CACHE_TTL_SECONDS,
        )?;
        // The cache window must not outlive the tokens it memoizes
        let validity_seconds = u64::try_from(token_validity_days)
            .unwrap_or(u64::MAX)
            .saturating_mul(86_400);
        if token_cache_ttl_seconds == 0 || token_cache_ttl_seconds > validity_seconds {
            return Err(invalid(
                "TOKEN_CACHE_TTL_SECONDS",
                "must be between 1 second and the token validity window",
            ));
        }

        let token_cache_capacity =
            parse_or_default(vars, "TOKEN_CACHE_CAPACITY", DEFAULT_TOKEN_CACHE_CAPACITY)?;
        if token_cache_capacity == 0 {
            return Err(invalid("TOKEN_CACHE_CAPACITY", "must be at least 1"));
        }

        let bcrypt_cost = parse_or_default(vars, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(invalid(
                "BCRYPT_COST",
                &format!("must be {}-{}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            ));
        }

        let log_format = match vars.get("LOG_FORMAT").map(|s| s.to_ascii_lowercase()) {
            None => LogFormat::Text,
            Some(s) if s == "text" => LogFormat::Text,
            Some(s) if s == "json" => LogFormat::Json,
            Some(other) => {
                return Err(invalid(
                    "LOG_FORMAT",
                    &format!("expected 'text' or 'json', got '{}'", other),
                ))
            }
        };

        let drain_seconds = parse_or_default(vars, "DRAIN_SECONDS", DEFAULT_DRAIN_SECONDS)?;

        Ok(Config {
            bind_address,
            jwt_secret,
            database_url,
            token_validity_days,
            token_cache_ttl: Duration::from_secs(token_cache_ttl_seconds),
            token_cache_capacity,
            bcrypt_cost,
            log_format,
            drain_period: Duration::from_secs(drain_seconds),
        })
    }

    /// Raw signing secret bytes.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn parse_or_default<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(name, &e.to_string())),
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
