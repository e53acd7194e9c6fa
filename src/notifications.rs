//! Notification feed derived from appointment state and the current time.
//!
//! Nothing here is stored. Each request runs two passes over the viewer's
//! scope: reminders for approved appointments starting within the next
//! 24 hours, then status-change notices. Output keeps that pass order and the
//! store's iteration order within each pass.
//!
//! Patient and staff classifications differ on purpose: a patient sees
//! `approved` in both passes, staff never see `approved` as a status change.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::appointment::AppointmentError;
use crate::authorization::{authorize, AccessDecision, Action};
use crate::db::AppointmentStore;
use crate::models::{
    Actor, Appointment, AppointmentStatus, FieldFilter, Notification, NotificationKind, Role,
};

/// Reminder look-ahead.
pub const REMINDER_WINDOW_HOURS: i64 = 24;

fn in_reminder_window(appt: &Appointment, now: DateTime<Utc>) -> bool {
    appt.status == AppointmentStatus::Approved
        && appt.date >= now
        && appt.date < now + Duration::hours(REMINDER_WINDOW_HOURS)
}

fn notification(
    appt: &Appointment,
    kind: NotificationKind,
    message: String,
    patient_id: Option<String>,
) -> Notification {
    Notification {
        appointment_id: appt.id.clone(),
        kind,
        message,
        date: appt.date,
        time: appt.slot.clone(),
        description: appt.description.clone(),
        status: appt.status,
        patient_id,
    }
}

// ─── Pure derivation ──────────────────────────────────────────────────────────

/// Patient feed over the appointments owned by `patient_id`. Appointments
/// belonging to anyone else are ignored.
pub fn patient_view(now: DateTime<Utc>, patient_id: &str, appointments: &[Appointment]) -> Vec<Notification> {
    let own = || appointments.iter().filter(|a| a.user_id == patient_id);

    let reminders = own().filter(|a| in_reminder_window(a, now)).map(|a| {
        notification(
            a,
            NotificationKind::Reminder,
            format!("Reminder: You have a confirmed appointment tomorrow at {}.", a.slot),
            None,
        )
    });

    let changes = own().filter_map(|a| {
        let message = match a.status {
            AppointmentStatus::Rescheduled => "Your appointment has been rescheduled.",
            AppointmentStatus::Canceled => "Your appointment has been canceled.",
            AppointmentStatus::Approved => "Your appointment has been confirmed.",
            AppointmentStatus::Pending => return None,
        };
        Some(notification(a, NotificationKind::StatusChange, message.into(), None))
    });

    reminders.chain(changes).collect()
}

/// Staff feed over every appointment. Each entry names the patient.
pub fn staff_view(now: DateTime<Utc>, appointments: &[Appointment]) -> Vec<Notification> {
    let reminders = appointments
        .iter()
        .filter(|a| in_reminder_window(a, now))
        .map(|a| {
            notification(
                a,
                NotificationKind::Reminder,
                format!(
                    "Reminder: {} has a confirmed appointment tomorrow at {}.",
                    a.user_id, a.slot
                ),
                Some(a.user_id.clone()),
            )
        });

    let changes = appointments.iter().filter_map(|a| {
        let message = match a.status {
            AppointmentStatus::Pending => {
                format!("New appointment for {} is pending confirmation.", a.user_id)
            }
            AppointmentStatus::Rescheduled => "An appointment has been rescheduled.".into(),
            AppointmentStatus::Canceled => "An appointment has been canceled.".into(),
            AppointmentStatus::Approved => return None,
        };
        Some(notification(
            a,
            NotificationKind::StatusChange,
            message,
            Some(a.user_id.clone()),
        ))
    });

    reminders.chain(changes).collect()
}

/// Role-dispatched derivation.
pub fn derive(now: DateTime<Utc>, viewer: &Actor, appointments: &[Appointment]) -> Vec<Notification> {
    match viewer.role {
        Role::Patient => patient_view(now, &viewer.id, appointments),
        Role::Staff => staff_view(now, appointments),
    }
}

// ─── Store-backed feed ────────────────────────────────────────────────────────

/// Reads the store and derives feeds. An empty `Vec` means "no
/// notifications" and is distinct from an `Err`.
#[derive(Clone)]
pub struct NotificationFeed {
    store: Arc<dyn AppointmentStore>,
}

impl NotificationFeed {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Feed for the caller's own appointments.
    pub fn for_patient(
        &self,
        viewer: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, AppointmentError> {
        let own = self
            .store
            .query_by_field(&FieldFilter::UserId(viewer.id.clone()))?;
        Ok(patient_view(now, &viewer.id, &own))
    }

    /// Clinic-wide feed. Staff only.
    pub fn for_staff(
        &self,
        viewer: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, AppointmentError> {
        if let AccessDecision::Deny(reason) = authorize(viewer, Action::ViewStaffFeed, None) {
            tracing::warn!(actor = %viewer.id, "staff feed denied");
            return Err(reason.into());
        }
        let all = self.store.query_all()?;
        Ok(staff_view(now, &all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentLifecycle, BookRequest};
    use crate::db::{DatabaseError, MemoryStore};
    use crate::models::{AppointmentPatch, NewAppointment};

    fn appt(id: &str, user: &str, status: AppointmentStatus, date: DateTime<Utc>) -> Appointment {
        Appointment {
            id: id.into(),
            date,
            slot: "10:00".into(),
            dentist: "Dr. Ndlovu".into(),
            dentist_id: "d-1".into(),
            description: "Cleaning".into(),
            user_id: user.into(),
            status,
            created_at: date - Duration::days(7),
            updated_at: None,
            version: 1,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_patient_approved_soon_appears_twice() {
        let now = now();
        let appts = vec![appt("a", "p-1", AppointmentStatus::Approved, now + Duration::hours(2))];

        let feed = patient_view(now, "p-1", &appts);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, NotificationKind::Reminder);
        assert!(feed[0].message.starts_with("Reminder:"));
        assert_eq!(feed[0].time, "10:00");
        assert_eq!(feed[1].kind, NotificationKind::StatusChange);
        assert_eq!(feed[1].message, "Your appointment has been confirmed.");
        assert!(feed.iter().all(|n| n.patient_id.is_none()));
    }

    #[test]
    fn test_reminder_window_is_half_open() {
        let now = now();
        let appts = vec![
            appt("at-now", "p-1", AppointmentStatus::Approved, now),
            appt("edge", "p-1", AppointmentStatus::Approved, now + Duration::hours(24)),
            appt("past", "p-1", AppointmentStatus::Approved, now - Duration::minutes(1)),
        ];

        let reminders: Vec<_> = patient_view(now, "p-1", &appts)
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Reminder)
            .map(|n| n.appointment_id)
            .collect();
        assert_eq!(reminders, vec!["at-now".to_string()]);
    }

    #[test]
    fn test_patient_status_messages() {
        let now = now();
        let later = now + Duration::days(10);
        let appts = vec![
            appt("pending", "p-1", AppointmentStatus::Pending, later),
            appt("moved", "p-1", AppointmentStatus::Rescheduled, later),
            appt("gone", "p-1", AppointmentStatus::Canceled, later),
        ];

        let feed = patient_view(now, "p-1", &appts);
        let messages: Vec<_> = feed.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Your appointment has been rescheduled.",
                "Your appointment has been canceled.",
            ]
        );
    }

    #[test]
    fn test_patient_view_ignores_other_patients() {
        let now = now();
        let appts = vec![appt("a", "p-2", AppointmentStatus::Canceled, now)];
        assert!(patient_view(now, "p-1", &appts).is_empty());
    }

    #[test]
    fn test_staff_excludes_approved_status_changes() {
        let now = now();
        let appts = vec![
            appt("soon", "p-1", AppointmentStatus::Approved, now + Duration::hours(3)),
            appt("far", "p-2", AppointmentStatus::Approved, now + Duration::days(3)),
            appt("new", "p-3", AppointmentStatus::Pending, now + Duration::days(1)),
            appt("moved", "p-1", AppointmentStatus::Rescheduled, now),
            appt("gone", "p-2", AppointmentStatus::Canceled, now),
        ];

        let feed = staff_view(now, &appts);
        let ids: Vec<_> = feed.iter().map(|n| n.appointment_id.as_str()).collect();
        // Passes keep input order, which stores guarantee only as insertion order.
        assert_eq!(ids, vec!["soon", "new", "moved", "gone"]);

        assert_eq!(feed[0].kind, NotificationKind::Reminder);
        assert_eq!(
            feed[0].message,
            "Reminder: p-1 has a confirmed appointment tomorrow at 10:00."
        );
        assert_eq!(feed[0].patient_id.as_deref(), Some("p-1"));
        assert_eq!(feed[1].message, "New appointment for p-3 is pending confirmation.");
        assert_eq!(feed[2].message, "An appointment has been rescheduled.");
        assert_eq!(feed[3].message, "An appointment has been canceled.");
    }

    #[test]
    fn test_derive_dispatches_on_role() {
        let now = now();
        let appts = vec![appt("new", "p-1", AppointmentStatus::Pending, now)];
        assert!(derive(now, &Actor::patient("p-1"), &appts).is_empty());
        assert_eq!(derive(now, &Actor::staff("s-1"), &appts).len(), 1);
    }

    #[test]
    fn test_empty_feed_is_ok_not_error() {
        let feed = NotificationFeed::new(Arc::new(MemoryStore::new()));
        let result = feed.for_patient(&Actor::patient("p-1"), Utc::now());
        assert!(matches!(result, Ok(ref v) if v.is_empty()));
    }

    #[test]
    fn test_patient_cannot_read_staff_feed() {
        let feed = NotificationFeed::new(Arc::new(MemoryStore::new()));
        let err = feed.for_staff(&Actor::patient("p-1"), Utc::now()).unwrap_err();
        assert!(matches!(err, AppointmentError::Forbidden(_)));
    }

    #[test]
    fn test_book_approve_scenario_yields_two_entries() {
        let store: Arc<dyn AppointmentStore> = Arc::new(MemoryStore::new());
        let engine = AppointmentLifecycle::new(store.clone());
        let feed = NotificationFeed::new(store);
        let patient = Actor::patient("p-1");
        let now = Utc::now();

        let id = engine
            .book(
                &patient,
                BookRequest {
                    date: now + Duration::hours(2),
                    dentist: "Dr. Ndlovu".into(),
                    dentist_id: "d-1".into(),
                    description: "Checkup".into(),
                    slot: "10:00".into(),
                },
            )
            .unwrap();
        assert_eq!(engine.get(&id).unwrap().status, AppointmentStatus::Pending);

        engine.approve(&id, &Actor::staff("s-1")).unwrap();
        assert_eq!(engine.get(&id).unwrap().status, AppointmentStatus::Approved);

        let entries = feed.for_patient(&patient, now).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|n| n.appointment_id == id));
        assert_eq!(entries[0].kind, NotificationKind::Reminder);
        assert_eq!(entries[1].kind, NotificationKind::StatusChange);
    }

    /// Store whose reads always fail, to show errors stay distinct from empty feeds.
    struct BrokenStore;

    impl AppointmentStore for BrokenStore {
        fn create(&self, _: NewAppointment) -> Result<String, DatabaseError> {
            Err(DatabaseError::LockPoisoned)
        }
        fn get(&self, _: &str) -> Result<Option<Appointment>, DatabaseError> {
            Err(DatabaseError::LockPoisoned)
        }
        fn update(&self, _: &str, _: &AppointmentPatch, _: u64) -> Result<(), DatabaseError> {
            Err(DatabaseError::LockPoisoned)
        }
        fn query_by_field(&self, _: &FieldFilter) -> Result<Vec<Appointment>, DatabaseError> {
            Err(DatabaseError::LockPoisoned)
        }
        fn query_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
            Err(DatabaseError::LockPoisoned)
        }
    }

    #[test]
    fn test_store_failure_is_an_error() {
        let feed = NotificationFeed::new(Arc::new(BrokenStore));
        let err = feed.for_patient(&Actor::patient("p-1"), Utc::now()).unwrap_err();
        assert!(matches!(err, AppointmentError::Storage(_)));
    }
}
