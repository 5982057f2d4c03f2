//! Common utilities and types shared across the user service crates.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for bearer token utilities (size limits, header parsing, iat checks)
pub mod jwt;
