//! Notification feed endpoints.
//!
//! - `GET /api/appointments/notifications/patient`
//! - `GET /api/appointments/notifications/staff`

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{Actor, Notification};

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub count: usize,
    pub notifications: Vec<Notification>,
}

fn feed(notifications: Vec<Notification>, empty_message: &str) -> Result<Json<FeedResponse>, ApiError> {
    if notifications.is_empty() {
        return Err(ApiError::NotFound(empty_message.into()));
    }
    Ok(Json(FeedResponse {
        count: notifications.len(),
        notifications,
    }))
}

pub async fn patient(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<FeedResponse>, ApiError> {
    feed(
        ctx.core.feed.for_patient(&actor, Utc::now())?,
        "No notifications found for this patient",
    )
}

pub async fn staff(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<FeedResponse>, ApiError> {
    feed(
        ctx.core.feed.for_staff(&actor, Utc::now())?,
        "No notifications found for this staff member",
    )
}
