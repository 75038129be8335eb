use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access control and evidence lookup.
pub mod evidence;
pub mod rbac;

// HTTP surface and its backing services.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Router segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use evidence::{EvidenceResolution, EvidenceResolver};
pub use rbac::{Permission, PermissionTable, Role};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// Shared, read-only permission table.
pub type RbacState = Arc<PermissionTable>;

/// ApiDoc
///
/// OpenAPI document for the portal, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_events, handlers::get_event_details, handlers::subscribe_newsletter,
        handlers::register_user, handlers::get_me, handlers::get_my_registrations,
        handlers::create_registration, handlers::request_evidence_upload,
        handlers::attach_evidence, handlers::get_my_evidence, handlers::get_admin_stats,
        handlers::get_admin_events, handlers::create_event, handlers::update_event,
        handlers::delete_event, handlers::get_admin_registrations,
        handlers::update_registration_status, handlers::get_registration_evidence,
        handlers::get_finance_records, handlers::get_users, handlers::update_user_role,
        handlers::get_roles, handlers::get_newsletter_subscribers
    ),
    components(
        schemas(
            models::User, models::Event, models::Registration, models::RegistrationStatus,
            models::NewsletterSubscriber, models::RegisterUserRequest,
            models::CreateEventRequest, models::UpdateEventRequest,
            models::CreateRegistrationRequest, models::UpdateRegistrationStatusRequest,
            models::EvidenceUploadRequest, models::EvidenceUploadResponse,
            models::AttachEvidenceRequest, models::NewsletterSubscribeRequest,
            models::UpdateRoleRequest, models::AdminDashboardStats, models::UserProfile,
            models::FinanceRecord, rbac::Role, rbac::Permission, rbac::RolePermissions,
        )
    ),
    tags(
        (name = "procure-portal", description = "Procurement Training Registration API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of application services. Cloned per request;
/// every field is either `Arc`-backed or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database access.
    pub repo: RepositoryState,
    /// Object storage for payment evidence.
    pub storage: StorageState,
    pub config: AppConfig,
    /// Role → permission table, loaded once at startup.
    pub rbac: RbacState,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RbacState {
    fn from_ref(app_state: &AppState) -> RbacState {
        app_state.rbac.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Extracting `AuthUser` rejects the request
/// with 401 before the handler runs when authentication fails.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles all routes, middleware and state into the application router.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware.
        .merge(public::public_routes())
        // Authenticated routes: rejected with 401 before any handler runs.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin handlers extract AuthUser themselves and check permissions inline.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. A fresh UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One tracing span per request, tagged with that ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: tags every request span with its
/// `x-request-id` so all log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
