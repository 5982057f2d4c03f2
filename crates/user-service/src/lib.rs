//! User Service Library
//!
//! Registration, login and self-service identity management behind stateless
//! HS256 bearer tokens.
//!
//! # Modules
//!
//! - `config` - Environment configuration
//! - `crypto` - Token codec and password hashing
//! - `errors` - Error type and HTTP error envelope
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authorization interceptor and HTTP metrics
//! - `models` - Records, views and request/response bodies
//! - `observability` - Tracing setup and metrics
//! - `repositories` - Identity store gateway (Postgres and in-memory)
//! - `routes` - Router, auth policy table and application state
//! - `services` - Registration, login and update pipelines

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
