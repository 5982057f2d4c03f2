//! Authorization interceptor.
//!
//! Runs ahead of every user route. Resolves an optional bearer credential
//! through the [`TokenResolutionCache`], builds a fresh [`AuthContext`] for
//! the request and enforces the route's [`AuthRequirement`].
//!
//! Accepted header forms: `Authorization: Bearer <token>` and
//! `Authorization: Token <token>`, scheme case-insensitive.

use crate::errors::UserError;
use crate::models::AuthContext;
use crate::services::TokenResolutionCache;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};
use common::jwt::parse_authorization;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// What a route demands of the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Credentials are ignored; the context is always empty.
    Anonymous,
    /// Credentials are resolved when present; absence or failure is fine.
    Optional,
    /// A credential must resolve, otherwise 401.
    Required,
}

/// Requirement per (method, route path). Unlisted routes are `Required`.
/// HEAD is looked up as GET, matching the router.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    rules: HashMap<(Method, String), AuthRequirement>,
}

impl AuthPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: Method, path: &str, requirement: AuthRequirement) -> Self {
        self.rules.insert((method, path.to_string()), requirement);
        self
    }

    pub fn requirement(&self, method: &Method, path: &str) -> AuthRequirement {
        let method = if method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };
        self.rules
            .get(&(method, path.to_string()))
            .copied()
            .unwrap_or(AuthRequirement::Required)
    }
}

/// State for the authorization middleware.
#[derive(Clone)]
pub struct AuthState {
    pub cache: Arc<TokenResolutionCache>,
    pub policy: Arc<AuthPolicy>,
}

/// Bearer credential from the `Authorization` header, if well formed.
fn extract_credential(req: &Request) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    match parse_authorization(value) {
        Some((_, token)) => Some(token.to_string()),
        None => {
            tracing::debug!(target: "user.middleware.auth", "Unrecognized Authorization header");
            None
        }
    }
}

/// Populate [`AuthContext`] and enforce the route's requirement.
///
/// # Response
///
/// - 401 with `WWW-Authenticate` when the route is `Required` and no
///   credential resolved
/// - Otherwise continues with the context in request extensions
#[instrument(skip_all, name = "user.middleware.auth")]
pub async fn authorize(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, UserError> {
    let requirement = state.policy.requirement(req.method(), req.uri().path());

    let context = match (requirement, extract_credential(&req)) {
        (AuthRequirement::Anonymous, _) | (_, None) => AuthContext::anonymous(),
        (_, Some(token)) => match state.cache.resolve(&token).await {
            Ok(identity) => AuthContext::authenticated(identity, token),
            Err(e) => {
                tracing::debug!(target: "user.middleware.auth", error = %e, "Credential did not resolve");
                AuthContext::anonymous()
            }
        },
    };

    if requirement == AuthRequirement::Required && !context.is_authenticated() {
        return Err(UserError::Unauthorized);
    }

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
