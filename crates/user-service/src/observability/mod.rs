//! Observability for the user service.
//!
//! # Privacy by Default
//!
//! All instrumentation uses `#[instrument(skip_all)]` and explicit field
//! allow-listing. Fields fall into three groups:
//! - **SAFE**: logged in plaintext (outcomes, operation names, usernames)
//! - **HASHED**: SHA-256 prefix for correlation (user ids, emails)
//! - **NEVER**: must not appear in logs (passwords, hashes, tokens, secrets)

pub mod metrics;

use crate::config::LogFormat;
use crate::errors::UserError;
use sha2::{Digest, Sha256};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated; good for matching log lines, not for secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to `default_filter`.
pub fn init_tracing(format: LogFormat, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }
}

/// Error categories for metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input or uniqueness conflicts
    Validation,
    /// Bad credentials or missing/invalid token
    Authentication,
    /// Missing records
    NotFound,
    /// Store, crypto and other server-side failures
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&UserError> for ErrorCategory {
    fn from(err: &UserError) -> Self {
        match err {
            UserError::Validation(_) | UserError::Conflict { .. } | UserError::PayloadTooLarge => {
                ErrorCategory::Validation
            }
            UserError::InvalidCredentials | UserError::Unauthorized => {
                ErrorCategory::Authentication
            }
            UserError::NotFound(_) => ErrorCategory::NotFound,
            UserError::Database(_) | UserError::Crypto(_) | UserError::Internal => {
                ErrorCategory::Internal
            }
        }
    }
}
