//! Custom test assertions for expressive tests
//!
//! - [`TokenAssertions`] inspect an issued token without verifying it
//! - [`EnvelopeAssertions`] check the JSON error envelope and user views

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

fn decode_part(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no part {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT part {}: {}", index, e))
}

fn claims_of(token: &str) -> JwtClaims {
    serde_json::from_slice(&decode_part(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject(&user_id)
///     .assert_for_username("alice")
///     .assert_expires_in(60 * 86_400);
/// ```
pub trait TokenAssertions {
    /// Assert HS256 compact JWT with the expected claim set
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the embedded username
    fn assert_for_username(&self, username: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: u64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader =
            serde_json::from_slice(&decode_part(self, 0)).expect("Failed to parse JWT header");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = claims_of(self);
        assert!(
            claims.iat < claims.exp,
            "Expected iat < exp, got iat={} exp={}",
            claims.iat,
            claims.exp
        );

        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );
        self
    }

    fn assert_for_username(&self, username: &str) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.username, username,
            "Expected username '{}', got '{}'",
            username, claims.username
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = claims_of(self);
        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;

        // Allow 5-second tolerance for clock skew
        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );

        self
    }
}

/// Assertions on JSON response bodies.
pub trait EnvelopeAssertions {
    /// Error envelope with the given `status`.
    fn assert_error_status(&self, status: u16) -> &Self;

    /// Error envelope listing `field` in `errors`.
    fn assert_field_error(&self, field: &str) -> &Self;

    /// No password-related key anywhere in the document.
    fn assert_no_password_fields(&self) -> &Self;
}

impl EnvelopeAssertions for serde_json::Value {
    fn assert_error_status(&self, status: u16) -> &Self {
        assert_eq!(
            self["status"].as_u64(),
            Some(u64::from(status)),
            "Expected error envelope with status {}, got {}",
            status,
            self
        );
        assert!(
            self["message"].is_string(),
            "Error envelope has no message: {}",
            self
        );
        self
    }

    fn assert_field_error(&self, field: &str) -> &Self {
        let errors = self["errors"]
            .as_array()
            .unwrap_or_else(|| panic!("Error envelope has no errors array: {}", self));
        assert!(
            errors.iter().any(|e| e["field"] == field),
            "Expected a field error for '{}', got {}",
            field,
            self
        );
        self
    }

    fn assert_no_password_fields(&self) -> &Self {
        fn walk(value: &serde_json::Value) -> bool {
            match value {
                serde_json::Value::Object(map) => map
                    .iter()
                    .any(|(key, v)| key.to_lowercase().contains("password") || walk(v)),
                serde_json::Value::Array(items) => items.iter().any(walk),
                _ => false,
            }
        }
        assert!(!walk(self), "Response exposes a password field: {}", self);
        self
    }
}
