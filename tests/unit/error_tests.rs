// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::http::StatusCode;
use axum::response::IntoResponse;
use luxe_backend::auth::TokenError;
use luxe_backend::error::AppError;
use luxe_backend::store::StoreError;
use luxe_backend::validation::ValidationError;
use std::io::{Error as IoError, ErrorKind};

use crate::test_utils::body_json;

#[test]
fn test_app_error_display() {
    assert_eq!(AppError::DuplicateUser.to_string(), "User already exists");
    assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid Credentials");
    assert_eq!(AppError::Unauthenticated.to_string(), "Unauthorized Token");

    let validation: AppError = ValidationError::MissingFields.into();
    assert_eq!(validation.to_string(), "All fields are required");
}

#[test]
fn test_app_error_status_codes() {
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AppError::from(StoreError::Io(IoError::new(ErrorKind::PermissionDenied, "denied")))
            .status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::from(TokenError::Signing("bad key".into())).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_store_failure_body_is_generic() {
    let err = AppError::from(StoreError::Io(IoError::new(
        ErrorKind::Other,
        "/srv/luxe/data/users is read-only",
    )));
    let body = body_json(err.into_response()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal server error");
}
