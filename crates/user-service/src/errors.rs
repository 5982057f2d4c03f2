//! User service error types.
//!
//! All errors map to an HTTP status via the `IntoResponse` impl and render the
//! envelope `{ "status": <code>, "message": <text>, "errors"?: [{field, message}] }`.
//! Messages for server-side failures are generic; the actual cause is logged.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A single field-level problem reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// User service error type.
///
/// Maps to HTTP status codes:
/// - Validation, Conflict, InvalidCredentials: 422 Unprocessable Entity
/// - Unauthorized: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - PayloadTooLarge: 413 Payload Too Large
/// - Database, Crypto, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl UserError {
    /// Conflict on a unique field, with the standard message.
    pub fn conflict(field: &str) -> Self {
        UserError::Conflict {
            field: field.to_string(),
            message: format!("{} is already taken", field),
        }
    }

    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            UserError::Validation(_) | UserError::Conflict { .. } | UserError::InvalidCredentials => {
                422
            }
            UserError::Unauthorized => 401,
            UserError::NotFound(_) => 404,
            UserError::PayloadTooLarge => 413,
            UserError::Database(_) | UserError::Crypto(_) | UserError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (message, errors) = match &self {
            UserError::Validation(fields) => {
                ("Validation failed".to_string(), Some(fields.clone()))
            }
            UserError::Conflict { field, message } => (
                "Conflict".to_string(),
                Some(vec![FieldError::new(field.clone(), message.clone())]),
            ),
            UserError::InvalidCredentials => {
                ("Email or password is invalid".to_string(), None)
            }
            UserError::Unauthorized => ("Unauthorized".to_string(), None),
            UserError::NotFound(resource) => (resource.clone(), None),
            UserError::PayloadTooLarge => ("Request body too large".to_string(), None),
            UserError::Database(err) => {
                tracing::error!(target: "user.database", error = %err, "Database operation failed");
                ("An internal database error occurred".to_string(), None)
            }
            UserError::Crypto(err) => {
                tracing::error!(target: "user.crypto", error = %err, "Cryptographic operation failed");
                ("An internal cryptographic error occurred".to_string(), None)
            }
            UserError::Internal => ("An internal error occurred".to_string(), None),
        };

        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse {
            status: code,
            message,
            errors,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"user-service\""),
            );
        }

        response
    }
}

/// Body that could not be read or deserialized. Reported against `body`.
fn body_rejection(status: StatusCode, detail: String) -> UserError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        UserError::PayloadTooLarge
    } else {
        UserError::Validation(vec![FieldError::new("body", detail)])
    }
}

impl From<JsonRejection> for UserError {
    fn from(rejection: JsonRejection) -> Self {
        body_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for UserError {
    fn from(rejection: FormRejection) -> Self {
        body_rejection(rejection.status(), rejection.body_text())
    }
}

/// Convert sqlx errors to UserError
impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Database(err.to_string())
    }
}
