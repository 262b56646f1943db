// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use luxe_common::{LoginRequest, RegisterRequest};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MAX_NAME_LENGTH: usize = 100;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex compiles")
});

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Registration input after the required-field and format checks
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input after the required-field check
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and normalise an email address
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = normalize_email(email);
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationError::InvalidEmail("malformed address".to_string()));
    }
    Ok(email)
}

/// Validate a display name
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(
            "contains control characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Whether a password has at least `min_length` characters
pub fn meets_minimum_length(password: &str, min_length: usize) -> bool {
    password.chars().count() >= min_length
}

fn required(value: Option<String>) -> ValidationResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingFields)
}

/// Passwords are taken verbatim; only an empty one counts as missing
fn required_password(value: Option<String>) -> ValidationResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingFields)
}

/// Check a registration body: every field present, well-formed email and name.
/// Password strength is checked later, after the duplicate check.
pub fn validate_registration(req: RegisterRequest) -> ValidationResult<Registration> {
    let name = required(req.name)?;
    let email = required(req.email)?;
    let password = required_password(req.password)?;
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(Registration {
        name: validate_name(&name)?,
        email: validate_email(&email)?,
        password,
    })
}

/// Check a login body. The email format is not checked so that a malformed
/// address fails exactly like an unknown one.
pub fn validate_login(req: LoginRequest) -> ValidationResult<Credentials> {
    let email = required(req.email)?;
    let password = required_password(req.password)?;
    Ok(Credentials {
        email: normalize_email(&email),
        password,
    })
}
