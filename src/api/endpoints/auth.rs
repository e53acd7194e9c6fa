//! Account endpoints. These run without a bearer token.
//!
//! - `POST /api/auth/register`
//! - `POST /api/auth/login`
//! - `POST /api/auth/forget-password`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{json_body, run_blocking};
use crate::accounts::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, MessageResponse};
use crate::models::Role;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let req = json_body(body)?;
    let core = ctx.core.clone();
    let user_id = run_blocking("register", move || core.accounts.register(req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user_id,
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let req = json_body(body)?;
    let core = ctx.core.clone();
    let session = run_blocking("login", move || core.accounts.login(&req, Utc::now())).await?;

    Ok(Json(LoginResponse {
        message: format!("Welcome to the {} portal!", session.role),
        token: session.token,
        user_id: session.user_id,
        role: session.role,
        expires_at: session.expires_at,
    }))
}

/// `POST /api/auth/forget-password`
pub async fn forget_password(
    State(ctx): State<ApiContext>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = json_body(body)?;
    let core = ctx.core.clone();
    run_blocking("forget-password", move || core.accounts.reset_password(&req)).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
