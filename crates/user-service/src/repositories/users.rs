//! User store: the only owner of identity records.
//!
//! Both adapters enforce username and email uniqueness themselves. The
//! service layer's existence checks only exist to produce friendly errors;
//! the store is what actually keeps two records from sharing a field.

use crate::errors::UserError;
use crate::models::{NewUser, User, UserChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::UserId;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Postgres constraint names mapped to the conflicting field.
const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Storage seam for identity records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Insert a record, assigning its id.
    ///
    /// Fails with `Conflict` if the username or email is already stored.
    async fn insert(&self, new_user: NewUser) -> Result<User, UserError>;

    /// Apply a partial field replace to record `id`.
    ///
    /// Fails with `NotFound` if the record is gone and with `Conflict` if a
    /// changed username or email belongs to another record.
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, UserError>;

    /// Cheap liveness check used by the readiness probe.
    async fn ping(&self) -> Result<(), UserError>;

    /// Short adapter name for logs and readiness output.
    fn kind(&self) -> &'static str;
}

// ============================================================================
// In-memory adapter
// ============================================================================

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// First unique field of `username`/`email` already held by a record other than `except`.
fn conflicting_field(
    users: &HashMap<UserId, User>,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> Option<&'static str> {
    let others = || users.values().filter(move |u| Some(u.id) != except);

    if let Some(username) = username {
        if others().any(|u| u.username == username) {
            return Some("username");
        }
    }
    if let Some(email) = email {
        if others().any(|u| u.email == email) {
            return Some("email");
        }
    }
    None
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, UserError> {
        // Check and insert under one write lock
        let mut users = self.users.write().await;

        if let Some(field) = conflicting_field(
            &users,
            Some(&new_user.username),
            Some(&new_user.email),
            None,
        ) {
            return Err(UserError::conflict(field));
        }

        let user = User {
            id: UserId::new(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: new_user.created_at,
            updated_at: new_user.updated_at,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if let Some(field) = conflicting_field(
            &users,
            changes.username.as_deref(),
            changes.email.as_deref(),
            Some(id),
        ) {
            return Err(UserError::conflict(field));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| UserError::NotFound("User not found".to_string()))?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = changes.updated_at;

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), UserError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// PostgreSQL adapter
// ============================================================================

/// Row shape of the `users` table.
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from(row.user_id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Map a write failure, turning unique violations into field conflicts.
fn map_write_error(e: sqlx::Error, context: &str) -> UserError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.constraint() {
            Some(USERNAME_CONSTRAINT) => return UserError::conflict("username"),
            Some(EMAIL_CONSTRAINT) => return UserError::conflict("email"),
            _ => {}
        }
    }
    UserError::Database(format!("{}: {}", context, e))
}

/// Store backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), UserError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| UserError::Database(format!("Failed to run migrations: {}", e)))
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, UserError> {
        // `column` is always one of the fixed names below, never caller input
        let query = format!(
            r#"
            SELECT user_id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE {} = $1
            "#,
            column
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::Database(format!("Failed to fetch user by {}: {}", column, e)))?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Database(format!("Failed to fetch user by id: {}", e)))?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        self.find_one("email", email).await
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING user_id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.created_at)
        .bind(new_user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create user"))?;

        Ok(row.into())
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = $5
            WHERE user_id = $1
            RETURNING user_id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id.0)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update user"))?;

        row.map(User::from)
            .ok_or_else(|| UserError::NotFound("User not found".to_string()))
    }

    async fn ping(&self) -> Result<(), UserError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| UserError::Database(format!("Ping failed: {}", e)))
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
