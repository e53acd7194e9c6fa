//! Store collaborator seams.
//!
//! The lifecycle engine and notification feed only see these traits, so a
//! SQLite-backed store and the in-memory store are interchangeable.

use crate::db::DatabaseError;
use crate::models::{
    Account, Appointment, AppointmentPatch, FieldFilter, NewAccount, NewAppointment,
};

/// Keyed appointment collection.
///
/// Query results come back in insertion order. Callers must not rely on
/// anything stronger than that.
pub trait AppointmentStore: Send + Sync {
    /// Insert a new appointment. The store assigns the key, stamps
    /// `created_at`, and starts `version` at 1.
    fn create(&self, new: NewAppointment) -> Result<String, DatabaseError>;

    fn get(&self, id: &str) -> Result<Option<Appointment>, DatabaseError>;

    /// Conditional write: applied only while the stored `version` equals
    /// `expected_version`, then bumps the version.
    ///
    /// Errors with `NotFound` for an unknown key and `VersionConflict` when
    /// another writer got there first.
    fn update(
        &self,
        id: &str,
        patch: &AppointmentPatch,
        expected_version: u64,
    ) -> Result<(), DatabaseError>;

    fn query_by_field(&self, filter: &FieldFilter) -> Result<Vec<Appointment>, DatabaseError>;

    fn query_all(&self) -> Result<Vec<Appointment>, DatabaseError>;
}

/// Registered users, keyed by id and unique by username.
pub trait AccountStore: Send + Sync {
    /// Errors with `ConstraintViolation` when the username is taken.
    fn create_account(&self, new: NewAccount) -> Result<String, DatabaseError>;

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError>;

    fn update_password(&self, id: &str, password_hash: &str) -> Result<(), DatabaseError>;
}
