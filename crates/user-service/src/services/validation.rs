//! Entity-shape validation for registration and update input.
//!
//! Every rule is evaluated before returning, so a single `Validation` error
//! lists all violated fields at once.

use crate::errors::{FieldError, UserError};
use crate::models::{RegisterRequest, UpdateRequest};
use common::secret::{ExposeSecret, SecretString};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Registration input that passed validation.
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// Update input that passed validation. `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct ValidUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

impl ValidUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

pub fn validate_registration(request: RegisterRequest) -> Result<ValidRegistration, UserError> {
    let mut errors = Vec::new();

    let username = required(request.username, "username", &mut errors)
        .and_then(|u| check_username(&u, &mut errors));
    let email =
        required(request.email, "email", &mut errors).and_then(|e| check_email(&e, &mut errors));
    let password = required(request.password, "password", &mut errors)
        .and_then(|p| check_password(p, &mut errors));

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => {
            Ok(ValidRegistration {
                username,
                email,
                password,
            })
        }
        _ => Err(UserError::Validation(errors)),
    }
}

pub fn validate_update(request: UpdateRequest) -> Result<ValidUpdate, UserError> {
    let mut errors = Vec::new();

    let update = ValidUpdate {
        username: request
            .username
            .and_then(|u| check_username(&u, &mut errors)),
        email: request.email.and_then(|e| check_email(&e, &mut errors)),
        password: request
            .password
            .and_then(|p| check_password(p, &mut errors)),
    };

    if errors.is_empty() {
        Ok(update)
    } else {
        Err(UserError::Validation(errors))
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required<T>(value: Option<T>, field: &str, errors: &mut Vec<FieldError>) -> Option<T> {
    if value.is_none() {
        errors.push(FieldError::new(field, "is required"));
    }
    value
}

fn check_username(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let username = raw.trim();
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH {
        errors.push(FieldError::new(
            "username",
            format!("must be at least {} characters", MIN_USERNAME_LENGTH),
        ));
        None
    } else if length > MAX_USERNAME_LENGTH {
        errors.push(FieldError::new(
            "username",
            format!("must be at most {} characters", MAX_USERNAME_LENGTH),
        ));
        None
    } else if username.contains(char::is_whitespace) {
        errors.push(FieldError::new("username", "must not contain whitespace"));
        None
    } else {
        Some(username.to_string())
    }
}

fn check_email(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = normalize_email(raw);

    if email.len() > MAX_EMAIL_LENGTH || !is_valid_email(&email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
        None
    } else {
        Some(email)
    }
}

fn check_password(password: SecretString, errors: &mut Vec<FieldError>) -> Option<SecretString> {
    let exposed = password.expose_secret();

    if exposed.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
        None
    } else if exposed.len() > MAX_PASSWORD_BYTES {
        errors.push(FieldError::new(
            "password",
            format!("must be at most {} bytes", MAX_PASSWORD_BYTES),
        ));
        None
    } else {
        Some(password)
    }
}

/// Basic shape check: `local@domain.tld`, no whitespace, no empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
