//! API endpoint handlers.
//!
//! Handlers are thin: extract, call the matching core service, shape the
//! response. Business rules live in the core modules.

pub mod appointments;
pub mod auth;
pub mod health;
pub mod notifications;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::api::error::ApiError;

/// Unwrap a JSON body, reporting malformed or incomplete bodies as 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Run a synchronous core call on the blocking pool.
///
/// Account operations hash passwords with PBKDF2, which would otherwise
/// stall the async worker thread for the whole derivation.
pub(crate) async fn run_blocking<T, E, F>(task: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("{task} task failed: {e}")))?
        .map_err(Into::into)
}
