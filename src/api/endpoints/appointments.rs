//! Appointment endpoints.
//!
//! Transitions:
//! - `POST   /api/appointments/book`
//! - `PUT    /api/appointments/:id` (reschedule)
//! - `DELETE /api/appointments/:id` (cancel)
//! - `PUT    /api/appointments/:id/approve`
//!
//! Listings answer 404 when nothing matches.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::json_body;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AppointmentMessage, MessageResponse};
use crate::appointment::{BookRequest, RescheduleRequest};
use crate::models::{Actor, Appointment};

/// `POST /api/appointments/book`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentMessage>), ApiError> {
    let req = json_body(body)?;
    let appointment_id = ctx.core.lifecycle.book(&actor, req)?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentMessage {
            message: "Appointment booked successfully",
            appointment_id,
        }),
    ))
}

/// `PUT /api/appointments/:id`
pub async fn reschedule(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<String>,
    body: Result<Json<RescheduleRequest>, JsonRejection>,
) -> Result<Json<AppointmentMessage>, ApiError> {
    let req = json_body(body)?;
    let appointment_id = ctx.core.lifecycle.reschedule(&appointment_id, &actor, req)?;

    Ok(Json(AppointmentMessage {
        message: "Appointment rescheduled successfully",
        appointment_id,
    }))
}

/// `DELETE /api/appointments/:id`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.core.lifecycle.cancel(&appointment_id, &actor)?;

    Ok(Json(MessageResponse {
        message: "Appointment canceled successfully",
    }))
}

/// `PUT /api/appointments/:id/approve`
pub async fn approve(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<String>,
) -> Result<Json<AppointmentMessage>, ApiError> {
    let appointment_id = ctx.core.lifecycle.approve(&appointment_id, &actor)?;

    Ok(Json(AppointmentMessage {
        message: "Appointment approved successfully",
        appointment_id,
    }))
}

// ─── Listings ─────────────────────────────────────────────────────────────────

fn non_empty(
    appointments: Vec<Appointment>,
    empty_message: &str,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    if appointments.is_empty() {
        return Err(ApiError::NotFound(empty_message.into()));
    }
    Ok(Json(appointments))
}

/// `GET /api/appointments/myappointments`
pub async fn mine(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    non_empty(
        ctx.core.listing.mine(&actor)?,
        "No appointments found for this patient",
    )
}

/// `GET /api/appointments/myappointments/confirmed`
pub async fn mine_confirmed(
    State(ctx): State<ApiContext>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    non_empty(
        ctx.core.listing.mine_confirmed(&actor)?,
        "No confirmed appointments found for this patient",
    )
}

/// `GET /api/appointments/allappointments`
pub async fn all(
    State(ctx): State<ApiContext>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    non_empty(ctx.core.listing.all()?, "No appointments found")
}

/// `GET /api/appointments/myappointments/allconfirmed`
pub async fn confirmed(
    State(ctx): State<ApiContext>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    non_empty(ctx.core.listing.confirmed()?, "No confirmed appointments found")
}
