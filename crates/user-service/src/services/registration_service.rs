//! Registration pipeline.
//!
//! # Steps
//!
//! 1. Validate every field (all violations reported together)
//! 2. Username must not exist
//! 3. Email must not exist
//! 4. Hash password (bcrypt, blocking pool)
//! 5. Stamp `created_at`/`updated_at`
//! 6. Insert through the store
//! 7. Transform with a freshly minted token
//! 8. Publish `Created`
//!
//! Steps 2-3 and 6 are not atomic. The store's own uniqueness enforcement is
//! the backstop when two registrations race past the existence checks.

use crate::crypto::hash_password_blocking;
use crate::errors::UserError;
use crate::models::{NewUser, RegisterRequest, UserEvent, UserView};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_error, record_user_operation};
use crate::observability::ErrorCategory;
use crate::repositories::UserStore;
use crate::services::entity_transformer::EntityTransformer;
use crate::services::events::UserEventBus;
use crate::services::validation::validate_registration;
use chrono::Utc;
use std::time::Instant;
use tracing::instrument;

/// Register a new user and return its view with a token attached.
#[instrument(skip_all, name = "user.services.register")]
pub async fn register_user(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    events: &UserEventBus,
    bcrypt_cost: u32,
    request: RegisterRequest,
) -> Result<UserView, UserError> {
    let start = Instant::now();
    let result = run_registration(store, transformer, events, bcrypt_cost, request).await;

    match &result {
        Ok(_) => record_user_operation("register", "success", start.elapsed()),
        Err(e) => {
            record_user_operation("register", "error", start.elapsed());
            record_error("register", ErrorCategory::from(e).as_str(), e.status_code());
        }
    }
    result
}

async fn run_registration(
    store: &dyn UserStore,
    transformer: &EntityTransformer,
    events: &UserEventBus,
    bcrypt_cost: u32,
    request: RegisterRequest,
) -> Result<UserView, UserError> {
    let valid = validate_registration(request)?;

    if store.find_by_username(&valid.username).await?.is_some() {
        tracing::debug!(target: "user.services.register", "Username already taken");
        return Err(UserError::conflict("username"));
    }

    if store.find_by_email(&valid.email).await?.is_some() {
        tracing::debug!(target: "user.services.register", "Email already taken");
        return Err(UserError::conflict("email"));
    }

    let password_hash = hash_password_blocking(valid.password, bcrypt_cost).await?;

    let now = Utc::now();
    let user = store
        .insert(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let view = transformer.transform(&user, true, None)?;
    events.publish(UserEvent::Created(view.clone()));

    tracing::info!(
        target: "user.services.register",
        user = %hash_for_correlation(&user.id.to_string()),
        username = %user.username,
        "User registered"
    );

    Ok(view)
}
