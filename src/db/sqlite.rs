use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::repository::{account, appointment};
use super::store::{AccountStore, AppointmentStore};
use super::DatabaseError;
use crate::models::{
    Account, Appointment, AppointmentPatch, FieldFilter, NewAccount, NewAppointment,
};

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;"
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════════════════════
// SqliteStore: store collaborator over one shared connection
// ═══════════════════════════════════════════════════════════

/// SQLite-backed implementation of both store traits.
///
/// One connection behind a mutex. Every trait call is a single statement
/// (or a statement plus a follow-up read on the failure path), so holding
/// the lock for the call is enough.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_database(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_memory_database()?),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl AppointmentStore for SqliteStore {
    fn create(&self, new: NewAppointment) -> Result<String, DatabaseError> {
        let conn = self.lock()?;
        appointment::insert_appointment(&conn, &new)
    }

    fn get(&self, id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let conn = self.lock()?;
        appointment::get_appointment(&conn, id)
    }

    fn update(
        &self,
        id: &str,
        patch: &AppointmentPatch,
        expected_version: u64,
    ) -> Result<(), DatabaseError> {
        let conn = self.lock()?;
        appointment::update_appointment(&conn, id, patch, expected_version)
    }

    fn query_by_field(&self, filter: &FieldFilter) -> Result<Vec<Appointment>, DatabaseError> {
        let conn = self.lock()?;
        appointment::query_appointments(&conn, Some(filter))
    }

    fn query_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
        let conn = self.lock()?;
        appointment::query_appointments(&conn, None)
    }
}

impl AccountStore for SqliteStore {
    fn create_account(&self, new: NewAccount) -> Result<String, DatabaseError> {
        let conn = self.lock()?;
        account::insert_account(&conn, &new)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        let conn = self.lock()?;
        account::find_account_by_username(&conn, username)
    }

    fn update_password(&self, id: &str, password_hash: &str) -> Result<(), DatabaseError> {
        let conn = self.lock()?;
        account::update_password_hash(&conn, id, password_hash)
    }
}
