//! In-memory store. Used by tests and by `CLINIC_STORE=memory` for demos.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::store::{AccountStore, AppointmentStore};
use super::DatabaseError;
use crate::models::*;

#[derive(Default)]
struct Collections {
    appointments: Vec<Appointment>,
    accounts: Vec<Account>,
}

/// Both collections in insertion-ordered vectors behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, DatabaseError> {
        self.inner.read().map_err(|_| DatabaseError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, DatabaseError> {
        self.inner.write().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl AppointmentStore for MemoryStore {
    fn create(&self, new: NewAppointment) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        self.write()?.appointments.push(Appointment {
            id: id.clone(),
            date: new.date,
            slot: new.slot,
            dentist: new.dentist,
            dentist_id: new.dentist_id,
            description: new.description,
            user_id: new.user_id,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        });
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.read()?.appointments.iter().find(|a| a.id == id).cloned())
    }

    fn update(
        &self,
        id: &str,
        patch: &AppointmentPatch,
        expected_version: u64,
    ) -> Result<(), DatabaseError> {
        let mut guard = self.write()?;
        let appt = guard
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: "Appointment".into(),
                id: id.into(),
            })?;

        if appt.version != expected_version {
            return Err(DatabaseError::VersionConflict {
                id: id.into(),
                expected: expected_version,
                found: appt.version,
            });
        }

        patch.apply(appt, Utc::now());
        appt.version += 1;
        Ok(())
    }

    fn query_by_field(&self, filter: &FieldFilter) -> Result<Vec<Appointment>, DatabaseError> {
        Ok(self
            .read()?
            .appointments
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    fn query_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
        Ok(self.read()?.appointments.clone())
    }
}

impl AccountStore for MemoryStore {
    fn create_account(&self, new: NewAccount) -> Result<String, DatabaseError> {
        let mut guard = self.write()?;
        if guard.accounts.iter().any(|a| a.username == new.username) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "username already taken: {}",
                new.username
            )));
        }

        let id = Uuid::new_v4().to_string();
        guard.accounts.push(Account {
            id: id.clone(),
            role: new.role,
            name: new.name,
            surname: new.surname,
            email: new.email,
            phone_number: new.phone_number,
            address: new.address,
            username: new.username,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    fn update_password(&self, id: &str, password_hash: &str) -> Result<(), DatabaseError> {
        let mut guard = self.write()?;
        let account = guard
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: "Account".into(),
                id: id.into(),
            })?;
        account.password_hash = password_hash.to_string();
        Ok(())
    }
}
