//! Bearer token utilities shared across the user service crates.
//!
//! - Size limit applied before any token parsing
//! - `Authorization` header parsing for the `Bearer` and `Token` schemes
//! - `iat` validation with clock skew tolerance
//!
//! # Security
//!
//! Header parsing never fails loudly: a missing or unrecognised header simply
//! yields no credential, and the caller decides whether anonymity is allowed.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Typical tokens issued by this service are ~250 bytes. Anything over the
/// limit is rejected before base64 decoding or signature checks.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` validation (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

// =============================================================================
// Error Types
// =============================================================================

/// Errors from the structural pre-checks on a token.
///
/// Messages are intentionally generic; details go to debug logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Authorization header
// =============================================================================

/// Credential schemes accepted in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Token <token>`
    Token,
}

impl AuthScheme {
    fn parse(scheme: &str) -> Option<Self> {
        if scheme.eq_ignore_ascii_case("bearer") {
            Some(Self::Bearer)
        } else if scheme.eq_ignore_ascii_case("token") {
            Some(Self::Token)
        } else {
            None
        }
    }
}

/// Extract the credential from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for any other
/// scheme (e.g. `Basic`), for a missing credential, or for a credential that
/// contains embedded whitespace.
///
/// ```rust
/// use common::jwt::{parse_authorization, AuthScheme};
///
/// assert_eq!(parse_authorization("Bearer abc.def.ghi"), Some((AuthScheme::Bearer, "abc.def.ghi")));
/// assert_eq!(parse_authorization("Token abc"), Some((AuthScheme::Token, "abc")));
/// assert_eq!(parse_authorization("Basic dXNlcjpwYXNz"), None);
/// ```
#[must_use]
pub fn parse_authorization(header_value: &str) -> Option<(AuthScheme, &str)> {
    let (scheme, credential) = header_value.trim().split_once(' ')?;
    let scheme = AuthScheme::parse(scheme)?;
    let credential = credential.trim();

    if credential.is_empty() || credential.contains(char::is_whitespace) {
        tracing::debug!(target: "common.jwt", "Authorization header has malformed credential");
        return None;
    }

    Some((scheme, credential))
}

// =============================================================================
// Validation
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` when the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Validate the `iat` (issued-at) claim against an explicit `now`.
///
/// Tokens claiming to be issued more than `clock_skew` in the future are
/// rejected.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if `iat > now + clock_skew`.
pub fn validate_iat_at(iat: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    let clock_skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}
