//! HTTP request handlers for the user service.

pub mod health;
pub mod metrics;
pub mod payload;
pub mod user_handler;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use payload::{Payload, MAX_BODY_BYTES};
