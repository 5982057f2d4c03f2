//! Builder for hand-crafted test tokens.
//!
//! Produces HS256 tokens outside the service's codec so tests can mint
//! expired, future-dated, forged or malformed credentials.

use crate::fixtures::{TEST_GHOST_USER_ID, TEST_JWT_SECRET};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

/// Builder for test tokens.
///
/// # Example
/// ```rust,ignore
/// let expired = TestTokenBuilder::new()
///     .for_user(user_id)
///     .with_username("alice")
///     .expired(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    username: String,
    exp: i64,
    iat: i64,
    secret: Vec<u8>,
}

impl TestTokenBuilder {
    /// Defaults: ghost subject, one hour validity, the test secret.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: TEST_GHOST_USER_ID.to_string(),
            username: "ghost".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            secret: TEST_JWT_SECRET.as_bytes().to_vec(),
        }
    }

    pub fn for_user(mut self, id: Uuid) -> Self {
        self.sub = id.to_string();
        self
    }

    /// Raw `sub`, e.g. something that is not a UUID.
    pub fn with_subject(mut self, sub: &str) -> Self {
        self.sub = sub.to_string();
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    /// Set expiration in seconds from now
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Expired `seconds_ago`, issued an hour before that.
    pub fn expired(mut self, seconds_ago: i64) -> Self {
        self.exp = (Utc::now() - Duration::seconds(seconds_ago)).timestamp();
        self.iat = self.exp - 3600;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.as_bytes().to_vec();
        self
    }

    /// The claims as a JSON value
    pub fn claims(&self) -> serde_json::Value {
        json!({
            "sub": self.sub,
            "username": self.username,
            "exp": self.exp,
            "iat": self.iat,
        })
    }

    /// Sign and return the compact token.
    pub fn build(self) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.claims(),
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("HS256 signing should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
