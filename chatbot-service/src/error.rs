use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dtos::ErrorResponse;

/// Cause of a 401 rejection from the authentication gate.
///
/// Each cause maps to its own machine-stable error code so clients can
/// distinguish a missing token from an invalid or expired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing or invalid Authorization header")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("User no longer exists")]
    UnknownUser,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "AUTH_MISSING_TOKEN",
            AuthFailure::InvalidToken => "AUTH_INVALID_TOKEN",
            AuthFailure::ExpiredToken => "AUTH_EXPIRED_TOKEN",
            AuthFailure::UnknownUser => "AUTH_UNKNOWN_USER",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),

    #[error("This username is already taken")]
    DuplicateUser,

    #[error("Message text cannot be empty")]
    EmptyMessage,

    // One generic message for both unknown-username and wrong-password,
    // so the endpoint cannot be used to enumerate accounts.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(AuthFailure),

    #[error("Access denied. Administrators only.")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION",
            AppError::DuplicateUser => "DUPLICATE_USER",
            AppError::EmptyMessage => "EMPTY_MESSAGE",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized(cause) => cause.code(),
            AppError::Forbidden => "FORBIDDEN",
            AppError::DatabaseError(_) => "STORE_ERROR",
            AppError::InternalError(_) => "INTERNAL",
            AppError::ConfigError(_) => "CONFIG",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::DuplicateUser
            | AppError::EmptyMessage => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // 500-class failures keep their detail server-side only.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = code, error = %self, "Request failed");
            "Internal server error. Please try again.".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: Some(code.to_string()),
            }),
        )
            .into_response()
    }
}
