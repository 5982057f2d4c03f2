//! Health check handlers.
//!
//! - `/health` (and `POST /user/health`): liveness, no dependency checks
//! - `/ready`: readiness, pings the identity store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe. Failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe. 200 when the store answers, 503 otherwise.
///
/// The store error is logged; the response carries a generic message.
#[tracing::instrument(skip_all, name = "user.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.kind();

    if let Err(e) = state.store.ping().await {
        tracing::warn!(target: "user.health", store, error = %e, "Readiness check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                store: Some(store),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            store: Some(store),
            error: None,
        }),
    )
}
