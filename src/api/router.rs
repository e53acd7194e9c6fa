//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. Auth validator → 2. Audit logger

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/appointments/book", post(endpoints::appointments::book))
        .route(
            "/appointments/:id",
            put(endpoints::appointments::reschedule).delete(endpoints::appointments::cancel),
        )
        .route(
            "/appointments/:id/approve",
            put(endpoints::appointments::approve),
        )
        .route(
            "/appointments/notifications/patient",
            get(endpoints::notifications::patient),
        )
        .route(
            "/appointments/notifications/staff",
            get(endpoints::notifications::staff),
        )
        .route(
            "/appointments/myappointments",
            get(endpoints::appointments::mine),
        )
        .route(
            "/appointments/myappointments/confirmed",
            get(endpoints::appointments::mine_confirmed),
        )
        .route(
            "/appointments/myappointments/allconfirmed",
            get(endpoints::appointments::confirmed),
        )
        .route(
            "/appointments/allappointments",
            get(endpoints::appointments::all),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/forget-password", post(endpoints::auth::forget_password))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
}
