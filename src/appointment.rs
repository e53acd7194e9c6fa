//! Appointment lifecycle engine: book, reschedule, cancel, approve.
//!
//! States: pending → {approved, rescheduled, canceled}, with reschedule and
//! cancel reachable from any state and approve blocked from approved and
//! canceled. Every transition is a read, an authorization check, then a
//! conditional write keyed on the version that was read. A lost race
//! surfaces as `Conflict`; nothing is retried here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authorization::{authorize, AccessDecision, Action, DenyReason};
use crate::db::{AppointmentStore, DatabaseError};
use crate::models::{Actor, Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};

// ─── Types ────────────────────────────────────────────────────────────────────

/// Request body for booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub date: DateTime<Utc>,
    pub dentist: String,
    pub dentist_id: String,
    #[serde(default)]
    pub description: String,
    pub slot: String,
}

/// Request body for rescheduling. Absent or empty fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub date: Option<DateTime<Utc>>,
    pub slot: Option<String>,
    pub description: Option<String>,
}

impl RescheduleRequest {
    fn into_patch(self) -> AppointmentPatch {
        AppointmentPatch {
            date: self.date,
            slot: self.slot.filter(|s| !s.trim().is_empty()),
            description: self.description.filter(|s| !s.trim().is_empty()),
            ..AppointmentPatch::status(AppointmentStatus::Rescheduled)
        }
    }
}

/// Outcomes reported to callers of the engine, the feed, and the listings.
#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<DenyReason> for AppointmentError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::NotFound => Self::NotFound,
            DenyReason::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

/// Map a failed conditional write onto the engine's outcomes.
fn write_error(err: DatabaseError) -> AppointmentError {
    match err {
        DatabaseError::NotFound { .. } => AppointmentError::NotFound,
        DatabaseError::VersionConflict { id, .. } => {
            tracing::warn!(appointment_id = %id, "concurrent write lost");
            AppointmentError::Conflict("This appointment was modified by another request".into())
        }
        other => AppointmentError::Storage(other),
    }
}

fn require(decision: AccessDecision, actor: &Actor, action: Action) -> Result<(), AppointmentError> {
    match decision {
        AccessDecision::Allow(reason) => {
            tracing::debug!(actor = %actor.id, action = action.as_str(), ?reason, "access granted");
            Ok(())
        }
        AccessDecision::Deny(reason) => {
            tracing::warn!(actor = %actor.id, action = action.as_str(), ?reason, "access denied");
            Err(reason.into())
        }
    }
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// Applies lifecycle transitions against an injected store.
#[derive(Clone)]
pub struct AppointmentLifecycle {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentLifecycle {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Read the current state of an appointment. Keys are trimmed first.
    pub fn get(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id.trim())?
            .ok_or(AppointmentError::NotFound)
    }

    /// Book a new appointment for the calling patient. Starts `pending`.
    pub fn book(&self, actor: &Actor, req: BookRequest) -> Result<String, AppointmentError> {
        require(authorize(actor, Action::Book, None), actor, Action::Book)?;

        if req.slot.trim().is_empty() {
            return Err(AppointmentError::Validation("slot is required".into()));
        }
        if req.dentist.trim().is_empty() {
            return Err(AppointmentError::Validation("dentist is required".into()));
        }

        let id = self.store.create(NewAppointment {
            date: req.date,
            slot: req.slot,
            dentist: req.dentist,
            dentist_id: req.dentist_id,
            description: req.description,
            user_id: actor.id.clone(),
        })?;

        tracing::info!(appointment_id = %id, patient = %actor.id, "appointment booked");
        Ok(id)
    }

    /// Move the appointment to `rescheduled`, updating date, slot and
    /// description where the request supplies them.
    ///
    /// There is no state guard: a canceled appointment can be rescheduled.
    pub fn reschedule(
        &self,
        appointment_id: &str,
        actor: &Actor,
        req: RescheduleRequest,
    ) -> Result<String, AppointmentError> {
        let id = appointment_id.trim();
        let current = self.store.get(id)?;
        require(
            authorize(actor, Action::Reschedule, current.as_ref()),
            actor,
            Action::Reschedule,
        )?;
        let Some(current) = current else {
            return Err(AppointmentError::NotFound);
        };

        self.store
            .update(id, &req.into_patch(), current.version)
            .map_err(write_error)?;

        tracing::info!(appointment_id = %id, from = %current.status, "appointment rescheduled");
        Ok(id.to_string())
    }

    /// Soft-cancel. Canceling an already canceled appointment succeeds
    /// without writing.
    pub fn cancel(&self, appointment_id: &str, actor: &Actor) -> Result<(), AppointmentError> {
        let id = appointment_id.trim();
        let current = self.store.get(id)?;
        require(authorize(actor, Action::Cancel, current.as_ref()), actor, Action::Cancel)?;
        let Some(current) = current else {
            return Err(AppointmentError::NotFound);
        };

        if current.status == AppointmentStatus::Canceled {
            tracing::debug!(appointment_id = %id, "already canceled");
            return Ok(());
        }

        self.store
            .update(
                id,
                &AppointmentPatch::status(AppointmentStatus::Canceled),
                current.version,
            )
            .map_err(write_error)?;

        tracing::info!(appointment_id = %id, by = %actor.id, "appointment canceled");
        Ok(())
    }

    /// Staff approval.
    ///
    /// Order of checks: existence, then state (approved or canceled is a
    /// `Conflict` for every caller), then role.
    pub fn approve(&self, appointment_id: &str, actor: &Actor) -> Result<String, AppointmentError> {
        let id = appointment_id.trim();
        let current = self.store.get(id)?.ok_or(AppointmentError::NotFound)?;

        if current.status == AppointmentStatus::Approved {
            return Err(AppointmentError::Conflict(
                "This appointment is already confirmed".into(),
            ));
        }
        if current.status.is_terminal() {
            return Err(AppointmentError::Conflict(
                "This appointment has been canceled and cannot be approved".into(),
            ));
        }

        require(
            authorize(actor, Action::Approve, Some(&current)),
            actor,
            Action::Approve,
        )?;

        self.store
            .update(
                id,
                &AppointmentPatch::status(AppointmentStatus::Approved),
                current.version,
            )
            .map_err(write_error)?;

        tracing::info!(appointment_id = %id, by = %actor.id, "appointment approved");
        Ok(id.to_string())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
