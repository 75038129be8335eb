use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    evidence::{self, EVIDENCE_PREFIX, EvidenceResolution, EvidenceResolver},
    models::{
        AdminDashboardStats, AttachEvidenceRequest, CreateEventRequest,
        CreateRegistrationRequest, Event, EvidenceUploadRequest, EvidenceUploadResponse,
        FinanceRecord, NewsletterSubscribeRequest, NewsletterSubscriber, RegisterUserRequest,
        Registration, UpdateEventRequest, UpdateRegistrationStatusRequest, UpdateRoleRequest,
        User, UserProfile,
    },
    rbac::{Permission, Role, RolePermissions},
    storage::sanitize_key,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// RegistrationFilter
///
/// Query parameters for GET /admin/registrations.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationFilter {
    /// Restrict the listing to one event.
    pub event_id: Option<Uuid>,
}

/// Signup response from Supabase `/auth/v1/signup`. Depending on the email
/// confirmation setting the user is either the top-level object or nested.
#[derive(Deserialize)]
struct SupabaseAuthResponse {
    id: Option<Uuid>,
    user: Option<SupabaseUser>,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Lower-cased alphanumeric extension of `filename`, or `bin`.
fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|ext| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string())
}

/// Loads a registration owned by `user_id`. Someone else's registration is
/// reported as missing.
async fn owned_registration(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<Registration, ApiError> {
    state
        .repo
        .get_registration(id)
        .await
        .filter(|r| r.user_id == user_id)
        .ok_or(ApiError::NotFound("Registration"))
}

/// Resolves a registration's payment evidence and streams it back.
///
/// The resolver is scoped to the registration's owner, so only keys inside
/// that user's folder are ever probed.
async fn serve_evidence(state: &AppState, registration: &Registration) -> Result<Response, ApiError> {
    let Some(stored_path) = registration
        .payment_evidence
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    else {
        return Err(ApiError::NotFound("Evidence"));
    };

    let resolver = EvidenceResolver::new(state.storage.as_ref())
        .for_user(registration.user_id.to_string())
        .with_probe_timeout(state.config.evidence_probe_timeout);

    match resolver.resolve_and_download(stored_path).await {
        EvidenceResolution::Found {
            resolved_path,
            object,
        } => {
            if resolved_path != stored_path {
                tracing::info!(
                    registration_id = %registration.id,
                    stored = %stored_path,
                    resolved = %resolved_path,
                    "Evidence served from a non-canonical path"
                );
            }

            let filename: String = resolved_path
                .rsplit('/')
                .next()
                .unwrap_or("evidence")
                .chars()
                .filter(|c| c.is_ascii_graphic() && *c != '"')
                .collect();
            let content_type = object
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());

            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{}\"", filename),
                    ),
                ],
                object.bytes,
            )
                .into_response())
        }
        EvidenceResolution::NotFound {
            attempted_paths,
            denied_paths,
        } => {
            tracing::warn!(
                registration_id = %registration.id,
                attempted = ?attempted_paths,
                denied = ?denied_paths,
                "Evidence file could not be located"
            );
            Err(ApiError::NotFound("Evidence"))
        }
    }
}

// --- Public Handlers ---

/// get_events
///
/// [Public Route] Lists published events, soonest first.
#[utoipa::path(
    get,
    path = "/events",
    responses((status = 200, description = "Published events", body = [Event]))
)]
pub async fn get_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.repo.get_published_events().await)
}

/// get_event_details
///
/// [Public Route] A single published event. Drafts are reported as missing.
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    state
        .repo
        .get_published_event(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Event"))
}

/// subscribe_newsletter
///
/// [Public Route] Adds an email to the newsletter list. Repeat signups are
/// accepted silently so the endpoint does not reveal who is subscribed.
#[utoipa::path(
    post,
    path = "/newsletter/subscribe",
    request_body = NewsletterSubscribeRequest,
    responses(
        (status = 201, description = "Subscribed"),
        (status = 200, description = "Already subscribed"),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn subscribe_newsletter(
    State(state): State<AppState>,
    Json(payload): Json<NewsletterSubscribeRequest>,
) -> Result<StatusCode, ApiError> {
    if !is_plausible_email(&payload.email) {
        return Err(ApiError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if state.repo.subscribe_newsletter(email).await {
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}

/// register_user
///
/// [Public Route] Creates the Supabase Auth account, then mirrors it into
/// `public.profiles`. Every new account starts as `ordinary_user`; roles are
/// only raised through PUT /admin/users/{id}/role.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, ApiError> {
    let (Some(supabase_url), Some(anon_key)) = (
        state.config.supabase_url.as_deref(),
        state.config.supabase_anon_key.as_deref(),
    ) else {
        tracing::error!("Signup requested but SUPABASE_URL / SUPABASE_ANON_KEY are not set");
        return Err(ApiError::Internal);
    };

    if !is_plausible_email(&payload.email) {
        return Err(ApiError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let client = reqwest::Client::new();
    let auth_url = format!("{}/auth/v1/signup", supabase_url);

    let response = client
        .post(auth_url)
        .header("apikey", anon_key)
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Supabase signup request failed: {}", e);
            ApiError::Internal
        })?;

    if !response.status().is_success() {
        tracing::info!(status = %response.status(), "Supabase rejected signup");
        return Err(ApiError::BadRequest(
            "Signup was rejected by the identity provider".to_string(),
        ));
    }

    let body = response.json::<SupabaseAuthResponse>().await.map_err(|e| {
        tracing::error!("Unexpected Supabase signup response: {}", e);
        ApiError::Internal
    })?;

    let user_id = body
        .user
        .map(|u| u.id)
        .or(body.id)
        .ok_or(ApiError::Internal)?;

    let new_user = User {
        id: user_id,
        email: payload.email.trim().to_lowercase(),
        full_name: payload.full_name,
        role: Role::OrdinaryUser.as_str().to_string(),
    };

    state
        .repo
        .create_user(new_user)
        .await
        .map(Json)
        .ok_or(ApiError::Internal)
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's profile and effective permissions.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(auth.id)
        .await
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: auth.role,
        permissions: state.rbac.get_role_permissions(auth.role).to_vec(),
    }))
}

/// get_my_registrations
///
/// [Authenticated Route] The caller's own registrations.
#[utoipa::path(
    get,
    path = "/me/registrations",
    responses((status = 200, description = "My registrations", body = [Registration]))
)]
pub async fn get_my_registrations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsViewOwn)?;
    Ok(Json(state.repo.get_my_registrations(auth.id).await))
}

/// create_registration
///
/// [Authenticated Route] Registers the caller for a published event.
#[utoipa::path(
    post,
    path = "/events/{id}/registrations",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registered", body = Registration),
        (status = 404, description = "Event not found or not open")
    )
)]
pub async fn create_registration(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsCreate)?;

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Full name is required".to_string()));
    }
    if !is_plausible_email(&payload.email) {
        return Err(ApiError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let registration = state
        .repo
        .create_registration(event_id, auth.id, payload)
        .await
        .ok_or(ApiError::NotFound("Event"))?;

    tracing::info!(
        registration_id = %registration.id,
        event_id = %event_id,
        user_id = %auth.id,
        "Registration created"
    );
    Ok((StatusCode::CREATED, Json(registration)))
}

/// request_evidence_upload
///
/// [Authenticated Route] Issues a presigned URL for uploading payment proof
/// directly to storage. The key always follows
/// `evidence/{user_id}/{event_id}/{uuid}.{ext}`.
#[utoipa::path(
    post,
    path = "/registrations/{id}/evidence/upload-url",
    params(("id" = Uuid, Path, description = "Registration ID")),
    request_body = EvidenceUploadRequest,
    responses(
        (status = 200, description = "URL", body = EvidenceUploadResponse),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn request_evidence_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvidenceUploadRequest>,
) -> Result<Json<EvidenceUploadResponse>, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsUploadEvidence)?;
    let registration = owned_registration(&state, id, auth.id).await?;

    let object_key = evidence::evidence_key(
        auth.id,
        registration.event_id,
        Uuid::new_v4(),
        &file_extension(&payload.filename),
    );

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| {
            tracing::error!("Storage Error: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(EvidenceUploadResponse {
        upload_url,
        resource_key: object_key,
    }))
}

/// attach_evidence
///
/// [Authenticated Route] Stores an uploaded file as the registration's payment
/// evidence. A previous file is deleted from storage on a best-effort basis.
#[utoipa::path(
    put,
    path = "/registrations/{id}/evidence",
    params(("id" = Uuid, Path, description = "Registration ID")),
    request_body = AttachEvidenceRequest,
    responses(
        (status = 200, description = "Updated", body = Registration),
        (status = 400, description = "Key outside the caller's evidence folder"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn attach_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachEvidenceRequest>,
) -> Result<Json<Registration>, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsUploadEvidence)?;
    let registration = owned_registration(&state, id, auth.id).await?;

    let key = sanitize_key(&payload.resource_key);
    let expected_prefix = format!("{EVIDENCE_PREFIX}{}/{}/", auth.id, registration.event_id);
    if !key.starts_with(&expected_prefix) {
        return Err(ApiError::BadRequest(
            "Evidence key does not belong to this registration".to_string(),
        ));
    }

    let updated = state
        .repo
        .set_payment_evidence(id, auth.id, key.clone())
        .await
        .ok_or(ApiError::NotFound("Registration"))?;

    if let Some(previous) = registration
        .payment_evidence
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        // Only the blob the old reference actually resolves to is removed.
        let resolver = EvidenceResolver::new(state.storage.as_ref())
            .for_user(registration.user_id.to_string())
            .with_probe_timeout(state.config.evidence_probe_timeout);

        match resolver.resolve_and_download(previous).await {
            EvidenceResolution::Found { resolved_path, .. } if resolved_path != key => {
                if let Err(e) = state.storage.delete(&resolved_path).await {
                    tracing::warn!(
                        registration_id = %id,
                        previous = %resolved_path,
                        error = %e,
                        "Failed to delete replaced evidence"
                    );
                }
            }
            EvidenceResolution::Found { .. } => {}
            EvidenceResolution::NotFound { .. } => {
                tracing::debug!(
                    registration_id = %id,
                    previous = %previous,
                    "Replaced evidence not found in storage, nothing to delete"
                );
            }
        }
    }

    Ok(Json(updated))
}

/// get_my_evidence
///
/// [Authenticated Route] Downloads the caller's own payment evidence.
#[utoipa::path(
    get,
    path = "/registrations/{id}/evidence",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Evidence file"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_my_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsViewOwn)?;
    let registration = owned_registration(&state, id, auth.id).await?;
    serve_evidence(&state, &registration).await
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = AdminDashboardStats),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    auth.require(&state.rbac, Permission::AdminDashboard)?;
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_events
///
/// [Admin Route] Every event, drafts included.
#[utoipa::path(
    get,
    path = "/admin/events",
    responses((status = 200, description = "All events", body = [Event]))
)]
pub async fn get_admin_events(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Event>>, ApiError> {
    auth.require_all(
        &state.rbac,
        &[Permission::AdminDashboard, Permission::EventsView],
    )?;
    Ok(Json(state.repo.get_all_events().await))
}

/// create_event
///
/// [Admin Route] Creates an unpublished event.
#[utoipa::path(
    post,
    path = "/admin/events",
    request_body = CreateEventRequest,
    responses((status = 201, description = "Created", body = Event))
)]
pub async fn create_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    auth.require(&state.rbac, Permission::EventsCreate)?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if payload.price_cents < 0 {
        return Err(ApiError::BadRequest("Price cannot be negative".to_string()));
    }

    let event = state
        .repo
        .create_event(payload, auth.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// update_event
///
/// [Admin Route] Partial update. Toggling `is_published` also requires
/// `events.publish`.
#[utoipa::path(
    put,
    path = "/admin/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    auth.require(&state.rbac, Permission::EventsUpdate)?;
    if payload.is_published.is_some() {
        auth.require(&state.rbac, Permission::EventsPublish)?;
    }

    state
        .repo
        .update_event(id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Event"))
}

/// delete_event
#[utoipa::path(
    delete,
    path = "/admin/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require(&state.rbac, Permission::EventsDelete)?;
    if state.repo.delete_event(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Event"))
    }
}

/// get_admin_registrations
///
/// [Admin Route] All registrations, optionally for one event.
#[utoipa::path(
    get,
    path = "/admin/registrations",
    params(RegistrationFilter),
    responses((status = 200, description = "Registrations", body = [Registration]))
)]
pub async fn get_admin_registrations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsViewAll)?;
    Ok(Json(state.repo.get_all_registrations(filter.event_id).await))
}

/// update_registration_status
///
/// [Admin Route] Confirms or rejects a registration after payment review.
#[utoipa::path(
    put,
    path = "/admin/registrations/{id}/status",
    params(("id" = Uuid, Path, description = "Registration ID")),
    request_body = UpdateRegistrationStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Registration),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_registration_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRegistrationStatusRequest>,
) -> Result<Json<Registration>, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsApprove)?;

    let registration = state
        .repo
        .set_registration_status(id, payload.status)
        .await
        .ok_or(ApiError::NotFound("Registration"))?;

    tracing::info!(
        registration_id = %id,
        status = payload.status.as_str(),
        reviewer = %auth.id,
        "Registration status changed"
    );
    Ok(Json(registration))
}

/// get_registration_evidence
///
/// [Admin Route] Downloads any registration's payment evidence for review.
#[utoipa::path(
    get,
    path = "/admin/registrations/{id}/evidence",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Evidence file"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_registration_evidence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    auth.require(&state.rbac, Permission::RegistrationsViewEvidence)?;
    let registration = state
        .repo
        .get_registration(id)
        .await
        .ok_or(ApiError::NotFound("Registration"))?;
    serve_evidence(&state, &registration).await
}

/// get_finance_records
///
/// [Admin Route] Registrations joined with event fees, for reconciliation.
#[utoipa::path(
    get,
    path = "/admin/finance/registrations",
    responses((status = 200, description = "Finance export", body = [FinanceRecord]))
)]
pub async fn get_finance_records(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FinanceRecord>>, ApiError> {
    auth.require(&state.rbac, Permission::FinanceExport)?;
    Ok(Json(state.repo.get_finance_records().await))
}

/// get_users
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require(&state.rbac, Permission::UsersView)?;
    Ok(Json(state.repo.list_users().await))
}

/// update_user_role
///
/// [Admin Route] Changes a user's role. The caller must be allowed to assign
/// the new role and must outrank the user's current role, so a super admin
/// cannot demote another super admin (or themselves).
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, ApiError> {
    if !state.rbac.can_assign_role(auth.role, payload.role) {
        return Err(ApiError::Forbidden);
    }

    let target = state
        .repo
        .get_user(id)
        .await
        .ok_or(ApiError::NotFound("User"))?;

    if !state.rbac.can_manage_role(auth.role, Role::parse(&target.role)) {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .repo
        .set_user_role(id, payload.role)
        .await
        .ok_or(ApiError::NotFound("User"))?;

    tracing::info!(
        target_user = %id,
        from = %target.role,
        to = %payload.role,
        actor = %auth.id,
        "Role changed"
    );
    Ok(Json(updated))
}

/// get_roles
///
/// [Admin Route] The active role → permission table.
#[utoipa::path(
    get,
    path = "/admin/roles",
    responses((status = 200, description = "Permission table", body = [RolePermissions]))
)]
pub async fn get_roles(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RolePermissions>>, ApiError> {
    auth.require(&state.rbac, Permission::UsersView)?;
    Ok(Json(state.rbac.rows()))
}

/// get_newsletter_subscribers
#[utoipa::path(
    get,
    path = "/admin/newsletter/subscribers",
    responses((status = 200, description = "Subscribers", body = [NewsletterSubscriber]))
)]
pub async fn get_newsletter_subscribers(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscriber>>, ApiError> {
    auth.require(&state.rbac, Permission::NewsletterView)?;
    Ok(Json(state.repo.get_newsletter_subscribers().await))
}
