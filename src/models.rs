use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::rbac::{Permission, Role};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from `public.profiles`. `role` holds the stored
/// role name; anything that does not parse as a [`Role`] grants nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, also the Foreign Key to the external auth.users table.
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

/// Event
///
/// A training course or workshop listed on the public site.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    #[ts(type = "string")]
    pub starts_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Registration fee in the smallest currency unit.
    pub price_cents: i64,
    pub capacity: Option<i32>,
    // Unpublished events are only visible on the admin dashboard.
    pub is_published: bool,
    pub created_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Registration
///
/// One attendee's registration for an event. `payment_evidence` is the
/// storage reference of the uploaded payment proof, in whatever form it was
/// written at upload time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    // Owner of the registration and of its evidence files.
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub status: String,
    pub payment_evidence: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// RegistrationStatus
///
/// Lifecycle of a registration. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Rejected => "rejected",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

/// NewsletterSubscriber
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for account creation (POST /register). The password is only
/// forwarded to Supabase Auth and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// CreateEventRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[ts(type = "string")]
    pub starts_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub ends_at: Option<DateTime<Utc>>,
    pub price_cents: i64,
    pub capacity: Option<i32>,
}

/// UpdateEventRequest
///
/// Partial update payload (PUT /admin/events/{id}). Only provided fields are
/// written; changing `is_published` additionally requires `events.publish`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEventRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

/// CreateRegistrationRequest
///
/// Attendee details for POST /events/{id}/registrations.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateRegistrationRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub organization: Option<String>,
}

/// UpdateRegistrationStatusRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
}

/// EvidenceUploadRequest
///
/// Asks for a presigned upload URL for a payment-proof file.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct EvidenceUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "bank_transfer.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

/// EvidenceUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct EvidenceUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to attach to the registration once the upload completes.
    pub resource_key: String,
}

/// AttachEvidenceRequest
///
/// Records an uploaded file as the registration's payment evidence
/// (PUT /registrations/{id}/evidence).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AttachEvidenceRequest {
    pub resource_key: String,
}

/// NewsletterSubscribeRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsletterSubscribeRequest {
    pub email: String,
}

/// UpdateRoleRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// --- Dashboard & Profile Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for GET /admin/stats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_events: i64,
    pub published_events: i64,
    pub total_registrations: i64,
    /// Registrations still awaiting payment verification.
    pub pending_registrations: i64,
    pub total_users: i64,
    pub newsletter_subscribers: i64,
}

/// UserProfile
///
/// Output schema for GET /me. `permissions` lets the dashboard decide which
/// panels to show without duplicating the policy client-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
}

/// FinanceRecord
///
/// One row of the finance export: a registration joined with its event fee.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FinanceRecord {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub full_name: String,
    pub email: String,
    pub organization: Option<String>,
    pub status: String,
    pub price_cents: i64,
    pub has_evidence: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}
