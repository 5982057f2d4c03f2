//! User identity handlers.
//!
//! Thin adapters from HTTP to the service layer. The [`AuthContext`] for each
//! request is placed in extensions by the authorization middleware. Bodies
//! arrive as JSON or form-encoded through [`Payload`].

use crate::errors::UserError;
use crate::handlers::payload::Payload;
use crate::models::{
    AuthContext, LoginRequest, LogoutResponse, RegisterRequest, StatusResponse, UpdateRequest,
    UserEnvelope,
};
use crate::routes::AppState;
use crate::services::{registration_service, user_service};
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

/// POST /user/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), UserError> {
    let user = registration_service::register_user(
        state.store.as_ref(),
        &state.transformer,
        &state.events,
        state.config.bcrypt_cost,
        payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserEnvelope { user })))
}

/// POST /user/login, POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Json<UserEnvelope>, UserError> {
    let user = user_service::login(state.store.as_ref(), &state.transformer, payload).await?;
    Ok(Json(UserEnvelope { user }))
}

/// GET /user/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserEnvelope>, UserError> {
    let user = user_service::get_me(state.store.as_ref(), &state.transformer, &auth).await?;
    Ok(Json(UserEnvelope { user }))
}

/// PUT /user/update
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Payload(payload): Payload<UpdateRequest>,
) -> Result<Json<UserEnvelope>, UserError> {
    let user = user_service::update_myself(
        state.store.as_ref(),
        &state.transformer,
        &state.events,
        state.config.bcrypt_cost,
        &auth,
        payload,
    )
    .await?;

    Ok(Json(UserEnvelope { user }))
}

/// GET /user/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<StatusResponse>, UserError> {
    let status = user_service::status(state.store.as_ref(), &state.transformer, &auth).await?;
    Ok(Json(status))
}

/// GET /user/logout, GET /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<LogoutResponse> {
    Json(user_service::logout(&state.cache, &auth).await)
}
