use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// A stored appointment as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub date: DateTime<Utc>,
    pub slot: String,
    pub dentist: String,
    pub dentist_id: String,
    pub description: String,
    pub user_id: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Write counter for conditional updates. Never leaves the process.
    #[serde(skip)]
    pub version: u64,
}

/// Fields supplied when booking. The store assigns the key and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub date: DateTime<Utc>,
    pub slot: String,
    pub dentist: String,
    pub dentist_id: String,
    pub description: String,
    pub user_id: String,
}

/// Marker asking the store to stamp the current time at write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimestamp;

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentPatch {
    pub date: Option<DateTime<Utc>>,
    pub slot: Option<String>,
    pub description: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub updated_at: Option<ServerTimestamp>,
}

impl AppointmentPatch {
    /// Status change stamped with the server time.
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            updated_at: Some(ServerTimestamp),
            ..Self::default()
        }
    }

    /// Apply onto a record in place. Used by stores that hold full documents.
    pub fn apply(&self, appt: &mut Appointment, now: DateTime<Utc>) {
        if let Some(date) = self.date {
            appt.date = date;
        }
        if let Some(slot) = &self.slot {
            appt.slot = slot.clone();
        }
        if let Some(description) = &self.description {
            appt.description = description.clone();
        }
        if let Some(status) = self.status {
            appt.status = status;
        }
        if self.updated_at.is_some() {
            appt.updated_at = Some(now);
        }
    }
}

/// Equality filter for `query_by_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    UserId(String),
    Status(AppointmentStatus),
}

impl FieldFilter {
    pub fn matches(&self, appt: &Appointment) -> bool {
        match self {
            Self::UserId(id) => &appt.user_id == id,
            Self::Status(status) => appt.status == *status,
        }
    }
}
