use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Reminder,
    StatusChange,
}

/// Derived view over one appointment. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub appointment_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub description: String,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}
