//! Secret types for values that must never reach a log line.
//!
//! Re-exports the [`secrecy`] wrappers used across the user service for
//! plaintext passwords and the token signing secret. `SecretString` redacts
//! itself in `Debug`, so a request struct can derive `Debug` and still be
//! traced safely. Reading the value requires an explicit `expose_secret()`.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct LoginRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req: LoginRequest =
//!     serde_json::from_str(r#"{"email":"alice@example.com","password":"hunter22"}"#).unwrap();
//!
//! assert!(!format!("{req:?}").contains("hunter22"));
//! assert_eq!(req.password.expose_secret(), "hunter22");
//! ```
//!
//! Use `SecretString` for:
//! - Plaintext passwords on the way to the hasher
//! - The HMAC secret tokens are signed with
//! - Database URLs carrying credentials

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
