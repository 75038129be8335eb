use crate::{
    models::{
        AdminDashboardStats, CreateEventRequest, CreateRegistrationRequest, Event, FinanceRecord,
        NewsletterSubscriber, Registration, RegistrationStatus, UpdateEventRequest, User,
    },
    rbac::Role,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, title, description, location, starts_at, ends_at, price_cents, \
     capacity, is_published, created_by, created_at, updated_at";

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, full_name, email, phone, organization, \
     status, payment_evidence, created_at, updated_at";

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see this
/// trait, so tests can swap in an in-memory implementation.
///
/// Methods never return database errors. Failures are logged and surface as
/// `None`, `false` or an empty list.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Option<User>;
    async fn list_users(&self) -> Vec<User>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User>;

    // --- Events ---
    // Public listing. Must enforce is_published=true.
    async fn get_published_events(&self) -> Vec<Event>;
    // Admin listing, drafts included.
    async fn get_all_events(&self) -> Vec<Event>;
    async fn get_published_event(&self, id: Uuid) -> Option<Event>;
    async fn create_event(&self, req: CreateEventRequest, created_by: Uuid) -> Option<Event>;
    // Uses COALESCE for partial updates.
    async fn update_event(&self, id: Uuid, req: UpdateEventRequest) -> Option<Event>;
    async fn delete_event(&self, id: Uuid) -> bool;

    // --- Registrations ---
    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        req: CreateRegistrationRequest,
    ) -> Option<Registration>;
    async fn get_registration(&self, id: Uuid) -> Option<Registration>;
    async fn get_my_registrations(&self, user_id: Uuid) -> Vec<Registration>;
    // Optional event filter for the admin dashboard.
    async fn get_all_registrations(&self, event_id: Option<Uuid>) -> Vec<Registration>;
    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Option<Registration>;
    // Owner-Only: updates only if user_id matches the registration owner.
    async fn set_payment_evidence(
        &self,
        id: Uuid,
        user_id: Uuid,
        path: String,
    ) -> Option<Registration>;

    // --- Finance ---
    async fn get_finance_records(&self) -> Vec<FinanceRecord>;

    // --- Newsletter ---
    // Idempotent: returns true only when a new subscriber row was inserted.
    async fn subscribe_newsletter(&self, email: String) -> bool;
    async fn get_newsletter_subscribers(&self) -> Vec<NewsletterSubscriber>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count error ({}): {:?}", sql, e);
                0
            })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, full_name, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    /// create_user
    ///
    /// Creates the mirroring profile record after Supabase signup.
    async fn create_user(&self, user: User) -> Option<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO profiles (id, email, full_name, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, full_name, role",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("create_user error: {:?}", e))
        .ok()
    }

    async fn list_users(&self) -> Vec<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, role FROM profiles ORDER BY email ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_users error: {:?}", e);
            vec![]
        })
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User> {
        sqlx::query_as::<_, User>(
            "UPDATE profiles SET role = $1 WHERE id = $2 RETURNING id, email, full_name, role",
        )
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_user_role error: {:?}", e);
            None
        })
    }

    // --- EVENTS ---

    async fn get_published_events(&self) -> Vec<Event> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE is_published = true ORDER BY starts_at ASC"
        );
        sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_published_events error: {:?}", e);
                vec![]
            })
    }

    async fn get_all_events(&self) -> Vec<Event> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY is_published ASC, starts_at DESC"
        );
        sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_all_events error: {:?}", e);
                vec![]
            })
    }

    async fn get_published_event(&self, id: Uuid) -> Option<Event> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND is_published = true");
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_published_event error: {:?}", e);
                None
            })
    }

    /// create_event
    ///
    /// New events start unpublished.
    async fn create_event(&self, req: CreateEventRequest, created_by: Uuid) -> Option<Event> {
        let sql = format!(
            "INSERT INTO events (id, title, description, location, starts_at, ends_at, price_cents, \
             capacity, is_published, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, $9, NOW(), NOW()) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title)
            .bind(req.description)
            .bind(req.location)
            .bind(req.starts_at)
            .bind(req.ends_at)
            .bind(req.price_cents)
            .bind(req.capacity)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_event error: {:?}", e))
            .ok()
    }

    async fn update_event(&self, id: Uuid, req: UpdateEventRequest) -> Option<Event> {
        let sql = format!(
            "UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                location = COALESCE($4, location), \
                starts_at = COALESCE($5, starts_at), \
                ends_at = COALESCE($6, ends_at), \
                price_cents = COALESCE($7, price_cents), \
                capacity = COALESCE($8, capacity), \
                is_published = COALESCE($9, is_published), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.location)
            .bind(req.starts_at)
            .bind(req.ends_at)
            .bind(req.price_cents)
            .bind(req.capacity)
            .bind(req.is_published)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_event error: {:?}", e);
                None
            })
    }

    async fn delete_event(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_event error: {:?}", e);
                false
            }
        }
    }

    // --- REGISTRATIONS ---

    /// create_registration
    ///
    /// Only published events accept registrations; the INSERT ... SELECT yields
    /// no row otherwise.
    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        req: CreateRegistrationRequest,
    ) -> Option<Registration> {
        let sql = format!(
            "INSERT INTO registrations (id, event_id, user_id, full_name, email, phone, organization, \
             status, payment_evidence, created_at, updated_at) \
             SELECT $1, e.id, $3, $4, $5, $6, $7, 'pending', NULL, NOW(), NOW() \
             FROM events e WHERE e.id = $2 AND e.is_published = true \
             RETURNING {REGISTRATION_COLUMNS}"
        );
        sqlx::query_as::<_, Registration>(&sql)
            .bind(Uuid::new_v4())
            .bind(event_id)
            .bind(user_id)
            .bind(req.full_name)
            .bind(req.email)
            .bind(req.phone)
            .bind(req.organization)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("create_registration error: {:?}", e);
                None
            })
    }

    async fn get_registration(&self, id: Uuid) -> Option<Registration> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1");
        sqlx::query_as::<_, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_registration error: {:?}", e);
                None
            })
    }

    async fn get_my_registrations(&self, user_id: Uuid) -> Vec<Registration> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Registration>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_my_registrations error: {:?}", e);
                vec![]
            })
    }

    async fn get_all_registrations(&self, event_id: Option<Uuid>) -> Vec<Registration> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE ($1::uuid IS NULL OR event_id = $1) ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Registration>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_all_registrations error: {:?}", e);
                vec![]
            })
    }

    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Option<Registration> {
        let sql = format!(
            "UPDATE registrations SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {REGISTRATION_COLUMNS}"
        );
        sqlx::query_as::<_, Registration>(&sql)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_registration_status error: {:?}", e);
                None
            })
    }

    async fn set_payment_evidence(
        &self,
        id: Uuid,
        user_id: Uuid,
        path: String,
    ) -> Option<Registration> {
        let sql = format!(
            "UPDATE registrations SET payment_evidence = $1, updated_at = NOW() \
             WHERE id = $2 AND user_id = $3 RETURNING {REGISTRATION_COLUMNS}"
        );
        sqlx::query_as::<_, Registration>(&sql)
            .bind(path)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_payment_evidence error: {:?}", e);
                None
            })
    }

    // --- FINANCE ---

    async fn get_finance_records(&self) -> Vec<FinanceRecord> {
        let query = r#"
            SELECT
                r.id AS registration_id,
                r.event_id,
                e.title AS event_title,
                r.full_name,
                r.email,
                r.organization,
                r.status,
                e.price_cents,
                (r.payment_evidence IS NOT NULL) AS has_evidence,
                r.created_at
            FROM registrations r
            JOIN events e ON r.event_id = e.id
            ORDER BY r.created_at DESC
        "#;

        sqlx::query_as::<_, FinanceRecord>(query)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_finance_records error: {:?}", e);
                vec![]
            })
    }

    // --- NEWSLETTER ---

    async fn subscribe_newsletter(&self, email: String) -> bool {
        let result = sqlx::query(
            "INSERT INTO newsletter_subscribers (id, email, created_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("subscribe_newsletter error: {:?}", e);
                false
            }
        }
    }

    async fn get_newsletter_subscribers(&self) -> Vec<NewsletterSubscriber> {
        sqlx::query_as::<_, NewsletterSubscriber>(
            "SELECT id, email, created_at FROM newsletter_subscribers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_newsletter_subscribers error: {:?}", e);
            vec![]
        })
    }

    // --- DASHBOARD ---

    async fn get_stats(&self) -> AdminDashboardStats {
        AdminDashboardStats {
            total_events: self.count("SELECT COUNT(*) FROM events").await,
            published_events: self
                .count("SELECT COUNT(*) FROM events WHERE is_published = true")
                .await,
            total_registrations: self.count("SELECT COUNT(*) FROM registrations").await,
            pending_registrations: self
                .count("SELECT COUNT(*) FROM registrations WHERE status = 'pending'")
                .await,
            total_users: self.count("SELECT COUNT(*) FROM profiles").await,
            newsletter_subscribers: self
                .count("SELECT COUNT(*) FROM newsletter_subscribers")
                .await,
        }
    }
}
