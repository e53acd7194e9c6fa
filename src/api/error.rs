//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::appointment::AppointmentError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired, log in again".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            // Invalid transitions are client errors, reported as 400.
            ApiError::Conflict(detail) => (StatusCode::BAD_REQUEST, "CONFLICT", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppointmentError> for ApiError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => ApiError::NotFound("Appointment not found".into()),
            AppointmentError::Forbidden(msg) => ApiError::Forbidden(msg),
            AppointmentError::Conflict(msg) => ApiError::Conflict(msg),
            AppointmentError::Validation(msg) => ApiError::BadRequest(msg),
            AppointmentError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UserNotFound => ApiError::NotFound(err.to_string()),
            AccountError::UsernameTaken
            | AccountError::UnknownUsername
            | AccountError::WrongPassword
            | AccountError::EmailMismatch
            | AccountError::Validation(_) => ApiError::BadRequest(err.to_string()),
            AccountError::Crypto(e) => ApiError::Internal(e.to_string()),
            AccountError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::TokenExpired => ApiError::TokenExpired,
            CryptoError::MalformedToken | CryptoError::BadSignature => ApiError::Unauthorized,
            CryptoError::MalformedHash | CryptoError::WeakSecret(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
