//! HTTP middleware for the user service.
//!
//! - `auth` - Authorization interceptor and per-route requirement table
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{authorize, AuthPolicy, AuthRequirement, AuthState};
pub use http_metrics::http_metrics_middleware;
