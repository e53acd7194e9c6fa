//! Appointment authorization gate.
//!
//! Pure predicate over (actor, action, appointment). Rules are checked in order:
//! 0. Target appointment must exist (except for `Book`) → otherwise NOT FOUND
//! 1. Book → patients only
//! 2. Reschedule → owner only
//! 3. Cancel → owner or staff
//! 4. Approve → staff only, regardless of ownership
//! 5. Staff feed → staff only
//!
//! State conflicts (approving an approved or canceled appointment) are not
//! decided here; the lifecycle engine reports those separately.

use crate::models::{Actor, Appointment, Role};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Action an actor wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Book,
    Reschedule,
    Cancel,
    Approve,
    ViewStaffFeed,
}

impl Action {
    /// Whether the action targets an existing appointment.
    fn needs_target(self) -> bool {
        matches!(self, Self::Reschedule | Self::Cancel | Self::Approve)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Reschedule => "reschedule",
            Self::Cancel => "cancel",
            Self::Approve => "approve",
            Self::ViewStaffFeed => "view staff notifications",
        }
    }
}

/// Why access was granted, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Patient acting on their own behalf (booking, or their own appointment).
    Owner,
    /// Staff role grants the action.
    StaffRole,
}

/// Why access was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Target appointment does not exist.
    NotFound,
    /// Target exists but this actor may not act on it.
    Forbidden(String),
}

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(AccessReason),
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    fn forbidden(action: Action) -> Self {
        Self::Deny(DenyReason::Forbidden(format!(
            "You do not have permission to {} this appointment",
            action.as_str()
        )))
    }
}

// ═══════════════════════════════════════════════════════════
// Authorization check
// ═══════════════════════════════════════════════════════════

/// Decide whether `actor` may perform `action` on `appointment`.
///
/// `appointment` is `None` when the key was not found in the store (or when
/// the action has no target). Existence is checked before permission, so an
/// unknown key is always `NotFound`, never `Forbidden`.
pub fn authorize(actor: &Actor, action: Action, appointment: Option<&Appointment>) -> AccessDecision {
    let target = match (action.needs_target(), appointment) {
        (true, None) => return AccessDecision::Deny(DenyReason::NotFound),
        (_, target) => target,
    };
    let is_owner = target.is_some_and(|appt| appt.user_id == actor.id);

    match (action, actor.role) {
        // Rule 1: staff cannot book on a patient's behalf through this path
        (Action::Book, Role::Patient) => AccessDecision::Allow(AccessReason::Owner),
        (Action::Book, Role::Staff) => AccessDecision::Deny(DenyReason::Forbidden(
            "Only patients can book appointments".into(),
        )),

        // Rule 2: owner only, staff included
        (Action::Reschedule, _) if is_owner => AccessDecision::Allow(AccessReason::Owner),
        (Action::Reschedule, _) => AccessDecision::forbidden(action),

        // Rule 3: owner or staff
        (Action::Cancel, _) if is_owner => AccessDecision::Allow(AccessReason::Owner),
        (Action::Cancel, Role::Staff) => AccessDecision::Allow(AccessReason::StaffRole),
        (Action::Cancel, Role::Patient) => AccessDecision::forbidden(action),

        // Rule 4: staff only, ownership irrelevant
        (Action::Approve, Role::Staff) => AccessDecision::Allow(AccessReason::StaffRole),
        (Action::Approve, Role::Patient) => AccessDecision::forbidden(action),

        // Rule 5
        (Action::ViewStaffFeed, Role::Staff) => AccessDecision::Allow(AccessReason::StaffRole),
        (Action::ViewStaffFeed, Role::Patient) => AccessDecision::Deny(DenyReason::Forbidden(
            "Staff notifications are only available to staff".into(),
        )),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::Utc;

    fn appt_owned_by(user_id: &str) -> Appointment {
        Appointment {
            id: "a-1".into(),
            date: Utc::now(),
            slot: "10:00".into(),
            dentist: "Dr. Dlamini".into(),
            dentist_id: "d-1".into(),
            description: "Cleaning".into(),
            user_id: user_id.into(),
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        }
    }

    fn is_forbidden(decision: &AccessDecision) -> bool {
        matches!(decision, AccessDecision::Deny(DenyReason::Forbidden(_)))
    }

    #[test]
    fn patient_can_book() {
        let decision = authorize(&Actor::patient("p-1"), Action::Book, None);
        assert_eq!(decision, AccessDecision::Allow(AccessReason::Owner));
    }

    #[test]
    fn staff_cannot_book() {
        let decision = authorize(&Actor::staff("s-1"), Action::Book, None);
        assert!(is_forbidden(&decision));
    }

    #[test]
    fn missing_target_is_not_found_before_permission() {
        for action in [Action::Reschedule, Action::Cancel, Action::Approve] {
            let decision = authorize(&Actor::patient("p-9"), action, None);
            assert_eq!(decision, AccessDecision::Deny(DenyReason::NotFound));
        }
    }

    #[test]
    fn owner_can_reschedule() {
        let appt = appt_owned_by("p-1");
        assert!(authorize(&Actor::patient("p-1"), Action::Reschedule, Some(&appt)).is_allowed());
    }

    #[test]
    fn other_patient_cannot_reschedule() {
        let appt = appt_owned_by("p-1");
        let decision = authorize(&Actor::patient("p-2"), Action::Reschedule, Some(&appt));
        assert!(is_forbidden(&decision));
    }

    #[test]
    fn staff_cannot_reschedule_patient_appointment() {
        let appt = appt_owned_by("p-1");
        let decision = authorize(&Actor::staff("s-1"), Action::Reschedule, Some(&appt));
        assert!(is_forbidden(&decision));
    }

    #[test]
    fn cancel_allowed_for_owner_and_staff() {
        let appt = appt_owned_by("p-1");
        assert_eq!(
            authorize(&Actor::patient("p-1"), Action::Cancel, Some(&appt)),
            AccessDecision::Allow(AccessReason::Owner)
        );
        assert_eq!(
            authorize(&Actor::staff("s-1"), Action::Cancel, Some(&appt)),
            AccessDecision::Allow(AccessReason::StaffRole)
        );
        assert!(is_forbidden(&authorize(
            &Actor::patient("p-2"),
            Action::Cancel,
            Some(&appt)
        )));
    }

    #[test]
    fn approve_is_staff_only_even_for_owner() {
        let appt = appt_owned_by("p-1");
        assert!(is_forbidden(&authorize(
            &Actor::patient("p-1"),
            Action::Approve,
            Some(&appt)
        )));
        assert!(authorize(&Actor::staff("s-1"), Action::Approve, Some(&appt)).is_allowed());
    }

    #[test]
    fn staff_feed_is_staff_only() {
        assert!(authorize(&Actor::staff("s-1"), Action::ViewStaffFeed, None).is_allowed());
        assert!(is_forbidden(&authorize(
            &Actor::patient("p-1"),
            Action::ViewStaffFeed,
            None
        )));
    }

    #[test]
    fn forbidden_message_names_the_action() {
        let appt = appt_owned_by("p-1");
        let decision = authorize(&Actor::patient("p-2"), Action::Reschedule, Some(&appt));
        match decision {
            AccessDecision::Deny(DenyReason::Forbidden(msg)) => {
                assert!(msg.contains("reschedule"));
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}
