//! Login, self-fetch, self-update and session operations.
//!
//! Everything here that needs a caller reads it from the [`AuthContext`]
//! built by the authorization middleware for the current request.

use crate::crypto::{hash_password_blocking, verify_password_blocking, DUMMY_PASSWORD_HASH};
use crate::errors::{FieldError, UserError};
use crate::models::{
    AuthContext, IdentitySummary, LoginRequest, LogoutResponse, StatusResponse, UpdateRequest,
    User, UserChanges, UserEvent, UserView,
};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_error, record_user_operation};
use crate::observability::ErrorCategory;
use crate::repositories::UserStore;
use crate::services::entity_transformer::EntityTransformer;
use crate::services::events::UserEventBus;
use crate::services::token_cache::TokenResolutionCache;
use crate::services::validation::{normalize_email, validate_update};
use chrono::Utc;
use common::secret::SecretString;
use common::types::UserId;
use std::time::Instant;
use tracing::instrument;

fn record_outcome<T>(operation: &'static str, start: Instant, result: &Result<T, UserError>) {
    match result {
        Ok(_) => record_user_operation(operation, "success", start.elapsed()),
        Err(e) => {
            record_user_operation(operation, "error", start.elapsed());
            record_error(operation, ErrorCategory::from(e).as_str(), e.status_code());
        }
    }
}

/// Authenticate by email and password.
///
/// # Steps
///
/// 1. Both fields present, otherwise `Validation`
/// 2. Look up by normalized email
/// 3. Verify the password, against [`DUMMY_PASSWORD_HASH`] when the email is unknown
/// 4. Unknown email and wrong password both yield `InvalidCredentials`
/// 5. Transform with a fresh token
#[instrument(skip_all, name = "user.services.login")]
pub async fn login(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    request: LoginRequest,
) -> Result<UserView, UserError> {
    let start = Instant::now();
    let result = run_login(store, transformer, request).await;
    record_outcome("login", start, &result);
    result
}

async fn run_login(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    request: LoginRequest,
) -> Result<UserView, UserError> {
    let (email, password) = login_fields(request)?;
    let email = normalize_email(&email);

    let user = store.find_by_email(&email).await?;

    // Always pay for one bcrypt verification
    let hash = user
        .as_ref()
        .map_or_else(|| DUMMY_PASSWORD_HASH.to_string(), |u| u.password_hash.clone());
    let matched = verify_password_blocking(password, hash).await?;

    let user = match user {
        Some(user) if matched => user,
        Some(user) => {
            tracing::warn!(
                target: "user.services.login",
                user = %hash_for_correlation(&user.id.to_string()),
                "Login failed: wrong password"
            );
            return Err(UserError::InvalidCredentials);
        }
        None => {
            tracing::warn!(
                target: "user.services.login",
                email = %hash_for_correlation(&email),
                "Login failed: unknown email"
            );
            return Err(UserError::InvalidCredentials);
        }
    };

    tracing::info!(
        target: "user.services.login",
        user = %hash_for_correlation(&user.id.to_string()),
        "User logged in"
    );

    transformer.transform(&user, true, None)
}

fn login_fields(request: LoginRequest) -> Result<(String, SecretString), UserError> {
    let mut errors = Vec::new();
    if request.email.is_none() {
        errors.push(FieldError::new("email", "is required"));
    }
    if request.password.is_none() {
        errors.push(FieldError::new("password", "is required"));
    }

    match (request.email, request.password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(UserError::Validation(errors)),
    }
}

/// The caller's own view, with the token they presented.
#[instrument(skip_all, name = "user.services.me")]
pub async fn get_me(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    auth: &AuthContext,
) -> Result<UserView, UserError> {
    let identity = auth.identity().ok_or(UserError::Unauthorized)?;
    let user = load_caller(store, identity).await?;
    transformer.transform(&user, true, auth.token())
}

/// Partially update the caller's own record.
///
/// # Steps
///
/// 1. Caller must be authenticated
/// 2. Validate the fields present
/// 3. Re-check uniqueness of a new username/email, ignoring the caller's record
/// 4. Re-hash a new password
/// 5. Write the partial change with `updated_at = now`
/// 6. Transform with the caller's current token and publish `Updated`
#[instrument(skip_all, name = "user.services.update")]
pub async fn update_myself(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    events: &UserEventBus,
    bcrypt_cost: u32,
    auth: &AuthContext,
    request: UpdateRequest,
) -> Result<UserView, UserError> {
    let start = Instant::now();
    let result = run_update(store, transformer, events, bcrypt_cost, auth, request).await;
    record_outcome("update", start, &result);
    result
}

async fn run_update(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    events: &UserEventBus,
    bcrypt_cost: u32,
    auth: &AuthContext,
    request: UpdateRequest,
) -> Result<UserView, UserError> {
    let identity = auth.identity().ok_or(UserError::Unauthorized)?;
    let valid = validate_update(request)?;

    if let Some(username) = valid.username.as_deref() {
        if taken_by_other(store.find_by_username(username).await?, identity.id) {
            return Err(UserError::conflict("username"));
        }
    }

    if let Some(email) = valid.email.as_deref() {
        if taken_by_other(store.find_by_email(email).await?, identity.id) {
            return Err(UserError::conflict("email"));
        }
    }

    let password_hash = match valid.password {
        Some(password) => Some(hash_password_blocking(password, bcrypt_cost).await?),
        None => None,
    };

    let user = store
        .update(
            identity.id,
            UserChanges {
                username: valid.username,
                email: valid.email,
                password_hash,
                updated_at: Utc::now(),
            },
        )
        .await?;

    let view = transformer.transform(&user, true, auth.token())?;
    events.publish(UserEvent::Updated(view.clone()));

    tracing::info!(
        target: "user.services.update",
        user = %hash_for_correlation(&user.id.to_string()),
        "User updated"
    );

    Ok(view)
}

fn taken_by_other(existing: Option<User>, caller: UserId) -> bool {
    existing.is_some_and(|u| u.id != caller)
}

/// Session introspection. Never fails on an anonymous caller.
///
/// A token whose record has since disappeared reports unauthenticated.
pub async fn status(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    auth: &AuthContext,
) -> Result<StatusResponse, UserError> {
    let Some(identity) = auth.identity() else {
        return Ok(StatusResponse {
            authenticated: false,
            user: None,
        });
    };

    match store.find_by_id(identity.id).await? {
        Some(user) => Ok(StatusResponse {
            authenticated: true,
            user: Some(transformer.transform(&user, true, auth.token())?),
        }),
        None => Ok(StatusResponse {
            authenticated: false,
            user: None,
        }),
    }
}

/// Drop the caller's token from the resolution cache.
///
/// Tokens are stateless, so the token itself stays valid until `exp` and
/// resolves again if presented.
pub async fn logout(cache: &TokenResolutionCache, auth: &AuthContext) -> LogoutResponse {
    if let Some(token) = auth.token() {
        let evicted = cache.invalidate(token).await;
        tracing::debug!(target: "user.services.logout", evicted, "Session torn down");
    }

    LogoutResponse {
        status: "logged_out".to_string(),
    }
}

async fn load_caller(store: &dyn UserStore, identity: &IdentitySummary) -> Result<User, UserError> {
    store
        .find_by_id(identity.id)
        .await?
        .ok_or_else(|| UserError::NotFound("User not found".to_string()))
}
