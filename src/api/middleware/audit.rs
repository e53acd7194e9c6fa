//! Audit logging middleware.
//!
//! Logs every protected request with the actor, method, path, and response
//! status. Runs innermost, after auth has injected the `Actor`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::models::Actor;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let actor = req.extensions().get::<Actor>().cloned();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    match actor {
        Some(actor) => tracing::info!(
            target: "clinic_scheduler_lib::audit",
            actor = %actor.id,
            role = %actor.role,
            %method,
            %path,
            status,
            "api access"
        ),
        None => tracing::info!(
            target: "clinic_scheduler_lib::audit",
            %method,
            %path,
            status,
            "api access (anonymous)"
        ),
    }

    response
}
