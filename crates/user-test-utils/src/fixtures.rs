//! Fixed fixtures for deterministic tests.

use std::collections::HashMap;
use user_service::config::{Config, ConfigError, MIN_BCRYPT_COST};
use uuid::Uuid;

/// Signing secret used by every test server.
pub const TEST_JWT_SECRET: &str = "test-secret-0123456789abcdef0123456789";

/// A different, equally valid secret. Tokens signed with it must not resolve.
pub const FOREIGN_JWT_SECRET: &str = "foreign-secret-fedcba9876543210fedcba98";

// User IDs for tokens that do not belong to a stored record (100-199)
pub const TEST_GHOST_USER_ID: Uuid = Uuid::from_u128(100);

/// Registration input for a test user.
#[derive(Debug, Clone, Copy)]
pub struct TestUser {
    pub username: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub const ALICE: TestUser = TestUser {
    username: "alice",
    email: "alice@example.com",
    password: "alice-password-1",
};

pub const BOB: TestUser = TestUser {
    username: "bob",
    email: "bob@example.com",
    password: "bob-password-22",
};

impl TestUser {
    /// Registration body.
    pub fn register_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
        })
    }

    /// Login body.
    pub fn login_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password,
        })
    }
}

/// Configuration for tests: fixed secret, cheapest allowed bcrypt cost,
/// in-memory store, ephemeral port.
pub fn test_config() -> Config {
    test_config_with(&[]).expect("test configuration should be valid")
}

/// [`test_config`] with extra or overriding environment variables.
pub fn test_config_with(overrides: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());
    vars.insert("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string());
    vars.insert("BCRYPT_COST".to_string(), MIN_BCRYPT_COST.to_string());
    for (name, value) in overrides {
        vars.insert((*name).to_string(), (*value).to_string());
    }
    Config::from_vars(&vars)
}
