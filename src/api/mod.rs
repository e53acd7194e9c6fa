//! HTTP API.
//!
//! Exposes account, appointment, notification, and listing operations as
//! JSON endpoints under `/api/`. Appointment routes are protected by a
//! middleware stack: Auth → Audit → Handler.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server_on, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
