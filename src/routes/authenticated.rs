use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Attendee-facing routes. The `auth_middleware` layer applied in
/// `create_router` rejects unauthenticated requests before they reach these
/// handlers; each handler then checks its own permission and, for
/// registration routes, that the caller owns the registration.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Profile plus the caller's effective permissions.
        .route("/me", get(handlers::get_me))
        // GET /me/registrations
        .route("/me/registrations", get(handlers::get_my_registrations))
        // POST /events/{id}/registrations
        // Only published events accept registrations.
        .route(
            "/events/{id}/registrations",
            post(handlers::create_registration),
        )
        // POST /registrations/{id}/evidence/upload-url
        // Presigned 10-minute upload URL under evidence/{user}/{event}/.
        .route(
            "/registrations/{id}/evidence/upload-url",
            post(handlers::request_evidence_upload),
        )
        // GET/PUT /registrations/{id}/evidence
        // Download the stored proof (through the path resolver) or attach a
        // freshly uploaded one.
        .route(
            "/registrations/{id}/evidence",
            get(handlers::get_my_evidence).put(handlers::attach_evidence),
        )
}
