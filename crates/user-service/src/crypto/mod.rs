use crate::config::{DEFAULT_TOKEN_VALIDITY_DAYS, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::UserError;
use crate::models::IdentitySummary;
use crate::observability::metrics::{
    record_bcrypt_duration, record_token_issuance, record_token_validation,
};
use chrono::{DateTime, Utc};
use common::jwt::{check_token_size, validate_iat_at, DEFAULT_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use common::types::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

/// Bcrypt hash compared against when the looked-up user does not exist.
///
/// Keeps login timing the same for unknown emails and wrong passwords.
pub const DUMMY_PASSWORD_HASH: &str =
    "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Token claims.
///
/// The `sub` field carries the user id and is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("username", &self.username)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Verification failure. Never shown to callers as-is; the interceptor turns
/// it into "unauthenticated" or a generic 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    fn as_label(self) -> &'static str {
        match self {
            TokenError::Invalid => "invalid",
            TokenError::Expired => "expired",
        }
    }
}

/// Signs and verifies HS256 bearer tokens with a process-wide secret.
///
/// Pure apart from the clock: verification never touches the store, so the
/// returned username is whatever was true when the token was minted.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: chrono::Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keys", &"[REDACTED]")
            .field("validity", &self.validity)
            .finish()
    }
}

impl TokenCodec {
    /// Codec with the default 60 day validity window.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_validity(secret, chrono::Duration::days(DEFAULT_TOKEN_VALIDITY_DAYS))
    }

    pub fn with_validity(secret: &[u8], validity: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity,
        }
    }

    pub fn validity(&self) -> chrono::Duration {
        self.validity
    }

    /// Mint a token for `summary`, expiring one validity window from now.
    pub fn issue(&self, summary: &IdentitySummary) -> Result<String, UserError> {
        self.issue_at(summary, Utc::now())
    }

    /// Mint a token as if the current time were `now`.
    #[instrument(skip_all)]
    pub fn issue_at(
        &self,
        summary: &IdentitySummary,
        now: DateTime<Utc>,
    ) -> Result<String, UserError> {
        let start = Instant::now();
        let iat = now.timestamp();
        let claims = Claims {
            sub: summary.id.to_string(),
            username: summary.username.clone(),
            iat,
            exp: iat.saturating_add(self.validity.num_seconds()),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let result = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| UserError::Crypto(format!("Token signing failed: {}", e)));

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());
        result
    }

    /// Verify `token` against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<IdentitySummary, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify `token` as if the current unix time were `now`.
    ///
    /// `Expired` once `now >= exp`. Anything else wrong with the token
    /// (size, encoding, signature, claims, `iat` in the future) is `Invalid`.
    #[instrument(skip_all)]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<IdentitySummary, TokenError> {
        let result = self.verify_claims(token, now);
        match &result {
            Ok(_) => record_token_validation("success", None),
            Err(e) => record_token_validation("error", Some(e.as_label())),
        }
        result
    }

    fn verify_claims(&self, token: &str, now: i64) -> Result<IdentitySummary, TokenError> {
        check_token_size(token).map_err(|_| TokenError::Invalid)?;

        // Expiry is checked below against `now` so that it can be injected
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "crypto", error = %e, "Token verification failed");
                TokenError::Invalid
            })?
            .claims;

        validate_iat_at(claims.iat, DEFAULT_CLOCK_SKEW, now).map_err(|_| TokenError::Invalid)?;

        if now >= claims.exp {
            tracing::debug!(target: "crypto", exp = claims.exp, now = now, "Token expired");
            return Err(TokenError::Expired);
        }

        let id = claims.sub.parse::<UserId>().map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Token subject is not a user id");
            TokenError::Invalid
        })?;

        Ok(IdentitySummary {
            id,
            username: claims.username,
        })
    }
}

/// Hash a password with bcrypt at `cost`.
///
/// # Errors
///
/// `UserError::Crypto` if `cost` is outside 10-14 or hashing fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, UserError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(UserError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    let start = Instant::now();
    let hash = bcrypt::hash(password, cost)
        .map_err(|e| UserError::Crypto(format!("Password hashing failed: {}", e)));
    record_bcrypt_duration("hash", start.elapsed());
    hash
}

/// Compare a password against a stored bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserError> {
    let start = Instant::now();
    let matched = bcrypt::verify(password, hash)
        .map_err(|e| UserError::Crypto(format!("Password verification failed: {}", e)));
    record_bcrypt_duration("verify", start.elapsed());
    matched
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(
    password: SecretString,
    cost: u32,
) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || hash_password(password.expose_secret(), cost))
        .await
        .map_err(|e| UserError::Crypto(format!("Hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: SecretString,
    hash: String,
) -> Result<bool, UserError> {
    tokio::task::spawn_blocking(move || verify_password(password.expose_secret(), &hash))
        .await
        .map_err(|e| UserError::Crypto(format!("Verification task failed: {}", e)))?
}
