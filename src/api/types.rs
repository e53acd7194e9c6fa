//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::Serialize;

use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
///
/// The authenticated caller is not stored here: the auth middleware puts
/// the verified `Actor` into request extensions.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Response bodies shared across endpoint modules
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// A message plus the id of the appointment it concerns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentMessage {
    pub message: &'static str,
    pub appointment_id: String,
}
