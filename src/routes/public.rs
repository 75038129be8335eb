use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints. Event reads must only ever return published
/// events; that filter lives in the repository queries.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Supabase signup plus profile creation. New accounts are ordinary users.
        .route("/register", post(handlers::register_user))
        // GET /events
        .route("/events", get(handlers::get_events))
        // GET /events/{id}
        .route("/events/{id}", get(handlers::get_event_details))
        // POST /newsletter/subscribe
        // Idempotent; repeat signups return 200 instead of 201.
        .route("/newsletter/subscribe", post(handlers::subscribe_newsletter))
}
