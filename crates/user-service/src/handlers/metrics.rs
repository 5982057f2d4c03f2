//! Prometheus scrape endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics
///
/// Renders every metric registered through `observability::metrics` in
/// Prometheus text format, e.g.
///
/// ```text
/// # TYPE user_http_requests_total counter
/// user_http_requests_total{method="GET",path="/user/me",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "user.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
