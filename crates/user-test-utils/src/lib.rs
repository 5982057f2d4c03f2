//! # User Service Test Utilities
//!
//! Shared test utilities for the user service.
//!
//! This crate provides:
//! - Fixed fixtures (signing secret, test users, deterministic IDs)
//! - Token builders for hand-crafted, expired and forged tokens
//! - Server test harness (`TestUserServer` for E2E tests)
//! - Custom assertions (`TokenAssertions`, `EnvelopeAssertions`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use user_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestUserServer::spawn().await?;
//!     let user = server.register(&ALICE).await?;
//!
//!     user["token"]
//!         .as_str()
//!         .unwrap()
//!         .to_string()
//!         .assert_valid_jwt()
//!         .assert_for_username("alice");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
