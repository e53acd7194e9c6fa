//! Read-only appointment listings.
//!
//! Each call returns `Ok(vec![])` when nothing matches; the API layer turns
//! that into a 404 "no results" response.

use std::sync::Arc;

use crate::appointment::AppointmentError;
use crate::db::AppointmentStore;
use crate::models::{Actor, Appointment, AppointmentStatus, FieldFilter};

#[derive(Clone)]
pub struct AppointmentListing {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentListing {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Every appointment, any status.
    pub fn all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.store.query_all()?)
    }

    /// Every approved appointment.
    pub fn confirmed(&self) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .store
            .query_by_field(&FieldFilter::Status(AppointmentStatus::Approved))?)
    }

    /// The viewer's own appointments, any status.
    pub fn mine(&self, viewer: &Actor) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .store
            .query_by_field(&FieldFilter::UserId(viewer.id.clone()))?)
    }

    /// The viewer's own appointments that are still on: pending or approved.
    pub fn mine_confirmed(&self, viewer: &Actor) -> Result<Vec<Appointment>, AppointmentError> {
        let mut own = self.mine(viewer)?;
        own.retain(|a| {
            matches!(
                a.status,
                AppointmentStatus::Pending | AppointmentStatus::Approved
            )
        });
        Ok(own)
    }
}
