// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use luxe_common::ApiResponse;
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateUser,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    /// Same text for an unknown email and a wrong password
    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("Unauthorized Token")]
    Unauthenticated,

    #[error("Admin access required")]
    Forbidden,

    #[error("{0} is not enabled")]
    NotConfigured(&'static str),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("User store did not answer '{0}' in time")]
    StoreTimeout(&'static str),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateUser
            | AppError::WeakPassword(_)
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotConfigured(_) => StatusCode::NOT_FOUND,
            AppError::Store(_)
            | AppError::StoreTimeout(_)
            | AppError::Token(_)
            | AppError::Password(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::DuplicateUser => "AUTH_001",
            AppError::WeakPassword(_) => "AUTH_002",
            AppError::InvalidCredentials => "AUTH_003",
            AppError::Unauthenticated => "AUTH_004",
            AppError::Forbidden => "AUTH_005",
            AppError::NotConfigured(_) => "CFG_001",
            AppError::Store(_) => "STORE_001",
            AppError::StoreTimeout(_) => "STORE_002",
            AppError::Token(_) => "TOKEN_001",
            AppError::Password(_) => "HASH_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Whether this is an unexpected failure on our side
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to the caller. Server errors never carry detail.
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        (status, Json(ApiResponse::error(self.public_message()))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::DuplicateUser,
            other => AppError::Store(other),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
