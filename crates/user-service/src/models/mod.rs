use chrono::{DateTime, Utc};
use common::secret::SecretString;
use common::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored user record.
///
/// Owned by the store; handlers only ever see it through [`UserView`].
/// The password hash is redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// The claims-sized subset of this record.
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Fields for a record about to be inserted. The store assigns the id.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial field replace applied by the update pipeline.
///
/// `None` leaves the stored value untouched. `updated_at` is always written.
#[derive(Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Identity carried inside a token and resolved by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    pub id: UserId,
    pub username: String,
}

/// Per-request authentication state.
///
/// Built fresh for every request by the authorization middleware, inserted
/// into request extensions, and handed to services explicitly. Never shared
/// between requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    identity: Option<IdentitySummary>,
    token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: IdentitySummary, token: String) -> Self {
        Self {
            identity: Some(identity),
            token: Some(token),
        }
    }

    pub fn identity(&self) -> Option<&IdentitySummary> {
        self.identity.as_ref()
    }

    /// Raw bearer token that produced the identity.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("identity", &self.identity)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// External representation of a user.
///
/// Built from an allow-list of fields; there is no path from [`User`] to this
/// type that copies the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
}

/// Response envelope for identity operations: `{ "user": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserView,
}

/// Registration request body.
///
/// Every field is optional at the wire level so that missing fields are
/// reported through the same field-level validation errors as bad ones.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Login request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Self-update request body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Response for `GET /user/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<UserView>,
}

/// Response for `GET /user/logout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub status: String,
}

/// Response for `GET /ready`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Change notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    Created(UserView),
    Updated(UserView),
}

impl UserEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            UserEvent::Created(_) => "created",
            UserEvent::Updated(_) => "updated",
        }
    }

    pub fn user(&self) -> &UserView {
        match self {
            UserEvent::Created(view) | UserEvent::Updated(view) => view,
        }
    }
}
