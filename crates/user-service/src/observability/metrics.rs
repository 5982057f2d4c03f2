//! Metrics definitions for the user service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `user_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: success, error
//! - `error_category`: invalid, expired
//! - `result`: hit, miss
//! - `operation`: bounded by code (register, login, update, hash, verify)
//! - `path`: known routes, everything else collapses to `/other`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle served at `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if a recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("user_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // bcrypt is slow by construction; coarse buckets starting at 50ms
        .set_buckets_for_metric(
            Matcher::Prefix("user_bcrypt".to_string()),
            &[0.050, 0.100, 0.200, 0.400, 0.800, 1.600],
        )
        .map_err(|e| format!("Failed to set bcrypt buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("user_token_issuance".to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Metric: `user_token_issuance_duration_seconds`, `user_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str, duration: Duration) {
    histogram!("user_token_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("user_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Metric: `user_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("user_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record a token resolution cache lookup.
///
/// Metric: `user_token_cache_lookups_total`
/// Labels: `result` (hit, miss)
pub fn record_token_cache_lookup(result: &str) {
    counter!("user_token_cache_lookups_total", "result" => result.to_string()).increment(1);
}

/// Metric: `user_token_cache_entries`
pub fn set_token_cache_entries(count: usize) {
    gauge!("user_token_cache_entries").set(count as f64);
}

// ============================================================================
// Identity Operation Metrics
// ============================================================================

/// Record a register, login or update outcome.
///
/// Metric: `user_operation_duration_seconds`, `user_operations_total`
/// Labels: `operation`, `status`
pub fn record_user_operation(operation: &str, status: &str, duration: Duration) {
    histogram!("user_operation_duration_seconds", "operation" => operation.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("user_operations_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record change notifications published to subscribers.
///
/// Metric: `user_events_published_total`
/// Labels: `kind` (created, updated)
pub fn record_event_published(kind: &str) {
    counter!("user_events_published_total", "kind" => kind.to_string()).increment(1);
}

// ============================================================================
// Crypto Metrics
// ============================================================================

/// Record bcrypt operation duration
///
/// Metric: `user_bcrypt_duration_seconds`
/// Labels: `operation` (hash, verify)
pub fn record_bcrypt_duration(operation: &str, duration: Duration) {
    histogram!("user_bcrypt_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Metric: `user_errors_total`
/// Labels: `operation`, `error_category`, `status_code`
pub fn record_error(operation: &str, error_category: &str, status_code: u16) {
    counter!("user_errors_total",
        "operation" => operation.to_string(),
        "error_category" => error_category.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `user_http_requests_total`, `user_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
///
/// Captures every response, including extractor rejections (400, 415, 422)
/// and routing failures (404, 405).
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("user_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("user_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Collapse unknown paths into `/other` so scanners cannot blow up label cardinality.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/login" => "/login",
        "/logout" => "/logout",
        "/user/health" => "/user/health",
        "/user/register" => "/user/register",
        "/user/login" => "/user/login",
        "/user/me" => "/user/me",
        "/user/update" => "/user/update",
        "/user/status" => "/user/status",
        "/user/logout" => "/user/logout",
        _ => "/other",
    }
}
