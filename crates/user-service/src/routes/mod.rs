//! HTTP routes for the user service.
//!
//! Defines the Axum router, the per-route authorization table and the
//! application state.

use crate::config::Config;
use crate::crypto::TokenCodec;
use crate::handlers::{self, user_handler, MAX_BODY_BYTES};
use crate::middleware::{authorize, http_metrics_middleware, AuthPolicy, AuthRequirement, AuthState};
use crate::repositories::UserStore;
use crate::services::{EntityTransformer, TokenResolutionCache, UserEventBus};
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Identity store (Postgres or in-memory).
    pub store: Arc<dyn UserStore>,

    /// Record to external view, with token minting.
    pub transformer: EntityTransformer,

    /// Bearer token resolution, shared with the authorization middleware.
    pub cache: Arc<TokenResolutionCache>,

    /// Created/Updated notifications.
    pub events: UserEventBus,

    pub config: Config,
}

impl AppState {
    /// Wire the token codec, cache and transformer from `config`.
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Self {
        let codec = Arc::new(TokenCodec::with_validity(
            config.jwt_secret_bytes(),
            chrono::Duration::days(config.token_validity_days),
        ));
        let cache = Arc::new(TokenResolutionCache::new(
            codec.clone(),
            config.token_cache_ttl,
            config.token_cache_capacity,
        ));

        Self {
            store,
            transformer: EntityTransformer::new(codec),
            cache,
            events: UserEventBus::default(),
            config,
        }
    }
}

/// Authorization requirement for every route behind the interceptor.
pub fn auth_policy() -> AuthPolicy {
    use AuthRequirement::{Anonymous, Optional, Required};

    AuthPolicy::new()
        .with(Method::POST, "/user/register", Anonymous)
        .with(Method::POST, "/user/login", Anonymous)
        .with(Method::POST, "/login", Anonymous)
        .with(Method::GET, "/user/me", Required)
        .with(Method::PUT, "/user/update", Required)
        .with(Method::GET, "/user/status", Optional)
        .with(Method::GET, "/user/logout", Optional)
        .with(Method::GET, "/logout", Optional)
}

/// Build the application routes.
///
/// - `/health`, `POST /user/health`, `/ready`, `/metrics` - public
/// - `/user/*`, `/login`, `/logout` - behind the authorization interceptor,
///   bodies capped at 1 MiB
/// - TraceLayer, 30 second timeout, HTTP metrics (outermost)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        cache: state.cache.clone(),
        policy: Arc::new(auth_policy()),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/user/health", post(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let user_routes = Router::new()
        .route("/user/register", post(user_handler::register))
        .route("/user/login", post(user_handler::login))
        .route("/login", post(user_handler::login))
        .route("/user/me", get(user_handler::me))
        .route("/user/update", put(user_handler::update))
        .route("/user/status", get(user_handler::status))
        .route("/user/logout", get(user_handler::logout))
        .route("/logout", get(user_handler::logout))
        .route_layer(middleware::from_fn_with_state(auth_state, authorize))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees 401/404/415 too)
    public_routes
        .merge(metrics_routes)
        .merge(user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
