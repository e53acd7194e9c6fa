pub mod memory;
pub mod repository;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use sqlite::*;
pub use store::{AccountStore, AppointmentStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid timestamp in column {column}: {value}")]
    InvalidTimestamp { column: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    #[error("Store lock poisoned")]
    LockPoisoned,
}
