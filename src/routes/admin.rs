use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Dashboard routes, nested under `/admin`. Every handler extracts `AuthUser`
/// and checks a specific permission, so a finance person and an event manager
/// see different slices of the same router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats (admin.dashboard)
        .route("/stats", get(handlers::get_admin_stats))
        // GET/POST /admin/events (events.view, events.create)
        .route(
            "/events",
            get(handlers::get_admin_events).post(handlers::create_event),
        )
        // PUT/DELETE /admin/events/{id} (events.update [+ events.publish], events.delete)
        .route(
            "/events/{id}",
            put(handlers::update_event).delete(handlers::delete_event),
        )
        // GET /admin/registrations (registrations.view_all)
        .route("/registrations", get(handlers::get_admin_registrations))
        // PUT /admin/registrations/{id}/status (registrations.approve)
        .route(
            "/registrations/{id}/status",
            put(handlers::update_registration_status),
        )
        // GET /admin/registrations/{id}/evidence (registrations.view_evidence)
        .route(
            "/registrations/{id}/evidence",
            get(handlers::get_registration_evidence),
        )
        // GET /admin/finance/registrations (finance.export)
        .route(
            "/finance/registrations",
            get(handlers::get_finance_records),
        )
        // GET /admin/users (users.view)
        .route("/users", get(handlers::get_users))
        // PUT /admin/users/{id}/role (super admin, outranking the target)
        .route("/users/{id}/role", put(handlers::update_user_role))
        // GET /admin/roles (users.view)
        .route("/roles", get(handlers::get_roles))
        // GET /admin/newsletter/subscribers (newsletter.view)
        .route(
            "/newsletter/subscribers",
            get(handlers::get_newsletter_subscribers),
        )
}
