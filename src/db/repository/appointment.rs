use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str =
    "id, date, slot, dentist, dentist_id, description, user_id, status, created_at, updated_at, version";

/// Raw row before enum and timestamp parsing.
struct AppointmentRow {
    id: String,
    date: String,
    slot: String,
    dentist: String,
    dentist_id: String,
    description: String,
    user_id: String,
    status: String,
    created_at: String,
    updated_at: Option<String>,
    version: i64,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            slot: row.get(2)?,
            dentist: row.get(3)?,
            dentist_id: row.get(4)?,
            description: row.get(5)?,
            user_id: row.get(6)?,
            status: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            version: row.get(10)?,
        })
    }

    fn into_appointment(self) -> Result<Appointment, DatabaseError> {
        Ok(Appointment {
            date: parse_timestamp("date", &self.date)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: self
                .updated_at
                .as_deref()
                .map(|s| parse_timestamp("updated_at", s))
                .transpose()?,
            status: AppointmentStatus::from_str(&self.status)?,
            id: self.id,
            slot: self.slot,
            dentist: self.dentist,
            dentist_id: self.dentist_id,
            description: self.description,
            user_id: self.user_id,
            version: self.version.max(0) as u64,
        })
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp {
            column: column.into(),
            value: value.into(),
        })
}

/// Insert a new appointment in `pending` state. Returns the generated key.
pub fn insert_appointment(conn: &Connection, new: &NewAppointment) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO appointments (id, date, slot, dentist, dentist_id, description, user_id, status, created_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
        params![
            id,
            format_timestamp(&new.date),
            new.slot,
            new.dentist,
            new.dentist_id,
            new.description,
            new.user_id,
            AppointmentStatus::Pending.as_str(),
            format_timestamp(&Utc::now()),
        ],
    )?;
    Ok(id)
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            AppointmentRow::from_row,
        )
        .optional()?;
    row.map(AppointmentRow::into_appointment).transpose()
}

/// Versioned update. Unset patch fields keep their stored value.
pub fn update_appointment(
    conn: &Connection,
    id: &str,
    patch: &AppointmentPatch,
    expected_version: u64,
) -> Result<(), DatabaseError> {
    let updated_at = patch.updated_at.map(|_| format_timestamp(&Utc::now()));
    let changed = conn.execute(
        "UPDATE appointments SET
            date = COALESCE(?1, date),
            slot = COALESCE(?2, slot),
            description = COALESCE(?3, description),
            status = COALESCE(?4, status),
            updated_at = COALESCE(?5, updated_at),
            version = version + 1
         WHERE id = ?6 AND version = ?7",
        params![
            patch.date.as_ref().map(format_timestamp),
            patch.slot,
            patch.description,
            patch.status.map(|s| s.as_str()),
            updated_at,
            id,
            expected_version as i64,
        ],
    )?;

    if changed == 1 {
        return Ok(());
    }

    let found: Option<i64> = conn
        .query_row(
            "SELECT version FROM appointments WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match found {
        None => Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.into(),
        }),
        Some(found) => Err(DatabaseError::VersionConflict {
            id: id.into(),
            expected: expected_version,
            found: found.max(0) as u64,
        }),
    }
}

/// All appointments in insertion order, optionally narrowed by one field.
pub fn query_appointments(
    conn: &Connection,
    filter: Option<&FieldFilter>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let (clause, value) = match filter {
        None => ("", None),
        Some(FieldFilter::UserId(user_id)) => ("WHERE user_id = ?1", Some(user_id.clone())),
        Some(FieldFilter::Status(status)) => {
            ("WHERE status = ?1", Some(status.as_str().to_string()))
        }
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments {clause} ORDER BY seq"
    ))?;

    let rows = match value {
        Some(v) => stmt
            .query_map(params![v], AppointmentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], AppointmentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    rows.into_iter().map(AppointmentRow::into_appointment).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::Duration;

    fn new_appt(user_id: &str) -> NewAppointment {
        NewAppointment {
            date: Utc::now() + Duration::days(3),
            slot: "14:00".into(),
            dentist: "Dr. Pillay".into(),
            dentist_id: "d-2".into(),
            description: "Filling".into(),
            user_id: user_id.into(),
        }
    }

    #[test]
    fn insert_starts_pending_without_updated_at() {
        let conn = open_memory_database().unwrap();
        let id = insert_appointment(&conn, &new_appt("p-1")).unwrap();

        let appt = get_appointment(&conn, &id).unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.user_id, "p-1");
        assert!(appt.updated_at.is_none());
        assert_eq!(appt.version, 1);
    }

    #[test]
    fn get_unknown_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_appointment(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn update_keeps_unset_fields_and_bumps_version() {
        let conn = open_memory_database().unwrap();
        let id = insert_appointment(&conn, &new_appt("p-1")).unwrap();

        let patch = AppointmentPatch {
            slot: Some("16:30".into()),
            ..AppointmentPatch::status(AppointmentStatus::Rescheduled)
        };
        update_appointment(&conn, &id, &patch, 1).unwrap();

        let appt = get_appointment(&conn, &id).unwrap().unwrap();
        assert_eq!(appt.slot, "16:30");
        assert_eq!(appt.description, "Filling");
        assert_eq!(appt.status, AppointmentStatus::Rescheduled);
        assert!(appt.updated_at.is_some());
        assert_eq!(appt.version, 2);
    }

    #[test]
    fn stale_version_is_rejected() {
        let conn = open_memory_database().unwrap();
        let id = insert_appointment(&conn, &new_appt("p-1")).unwrap();
        let patch = AppointmentPatch::status(AppointmentStatus::Approved);
        update_appointment(&conn, &id, &patch, 1).unwrap();

        let err = update_appointment(&conn, &id, &patch, 1).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::VersionConflict { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn update_unknown_is_not_found() {
        let conn = open_memory_database().unwrap();
        let patch = AppointmentPatch::status(AppointmentStatus::Canceled);
        let err = update_appointment(&conn, "missing", &patch, 1).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn query_filters_and_keeps_insertion_order() {
        let conn = open_memory_database().unwrap();
        let a = insert_appointment(&conn, &new_appt("p-1")).unwrap();
        let b = insert_appointment(&conn, &new_appt("p-2")).unwrap();
        let c = insert_appointment(&conn, &new_appt("p-1")).unwrap();
        update_appointment(&conn, &b, &AppointmentPatch::status(AppointmentStatus::Approved), 1)
            .unwrap();

        let all = query_appointments(&conn, None).unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);

        let mine = query_appointments(&conn, Some(&FieldFilter::UserId("p-1".into()))).unwrap();
        assert_eq!(mine.len(), 2);

        let approved =
            query_appointments(&conn, Some(&FieldFilter::Status(AppointmentStatus::Approved)))
                .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, b);
    }
}
