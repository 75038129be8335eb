//! Shared fixtures for the integration tests: an in-memory `Repository` and
//! `AppState` builders.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use procure_portal::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    models::{
        AdminDashboardStats, CreateEventRequest, CreateRegistrationRequest, Event, FinanceRecord,
        NewsletterSubscriber, Registration, RegistrationStatus, UpdateEventRequest, User,
    },
    rbac::{PermissionTable, Role},
    repository::Repository,
    storage::MockStorageService,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const ATTENDEE_ID: Uuid = Uuid::from_u128(0xa11ce);
pub const OTHER_ATTENDEE_ID: Uuid = Uuid::from_u128(0xb0b);
pub const SUPER_ADMIN_ID: Uuid = Uuid::from_u128(0x5a);
pub const FINANCE_ID: Uuid = Uuid::from_u128(0xf1);
pub const EVENT_MANAGER_ID: Uuid = Uuid::from_u128(0xe3);
pub const EVENT_ID: Uuid = Uuid::from_u128(0xe7e47);
pub const DRAFT_EVENT_ID: Uuid = Uuid::from_u128(0xd7af7);

/// In-memory repository. Mirrors the Postgres semantics the handlers rely on:
/// drafts are hidden from public reads, registrations need a published event
/// and evidence can only be attached by the owner.
#[derive(Default)]
pub struct InMemoryRepo {
    pub users: Mutex<Vec<User>>,
    pub events: Mutex<Vec<Event>>,
    pub registrations: Mutex<Vec<Registration>>,
    pub subscribers: Mutex<Vec<NewsletterSubscriber>>,
}

impl InMemoryRepo {
    /// One user per role, one published and one draft event.
    pub fn seeded() -> Self {
        let repo = Self::default();
        {
            let mut users = repo.users.lock().unwrap();
            users.push(user(ATTENDEE_ID, "ordinary_user"));
            users.push(user(OTHER_ATTENDEE_ID, "ordinary_user"));
            users.push(user(SUPER_ADMIN_ID, "super_admin"));
            users.push(user(FINANCE_ID, "finance_person"));
            users.push(user(EVENT_MANAGER_ID, "event_manager"));
        }
        {
            let mut events = repo.events.lock().unwrap();
            events.push(event(EVENT_ID, "Public Procurement Fundamentals", true));
            events.push(event(DRAFT_EVENT_ID, "Contract Management (draft)", false));
        }
        repo
    }

    pub fn with_registration(self, registration: Registration) -> Self {
        self.registrations.lock().unwrap().push(registration);
        self
    }

    pub fn with_user(self, new_user: User) -> Self {
        self.users.lock().unwrap().push(new_user);
        self
    }

    pub fn registration(&self, id: Uuid) -> Option<Registration> {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn user_role(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.role.clone())
    }
}

pub fn user(id: Uuid, role: &str) -> User {
    User {
        id,
        email: format!("{}@example.org", role),
        full_name: Some(format!("Test {}", role)),
        role: role.to_string(),
    }
}

pub fn event(id: Uuid, title: &str, is_published: bool) -> Event {
    Event {
        id,
        title: title.to_string(),
        description: "Two-day course".to_string(),
        location: "Kampala".to_string(),
        starts_at: Utc::now(),
        ends_at: None,
        price_cents: 250_000,
        capacity: Some(40),
        is_published,
        created_by: SUPER_ADMIN_ID,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn registration(id: Uuid, user_id: Uuid, payment_evidence: Option<&str>) -> Registration {
    Registration {
        id,
        event_id: EVENT_ID,
        user_id,
        full_name: "Jane Attendee".to_string(),
        email: "jane@example.org".to_string(),
        phone: None,
        organization: Some("Ministry of Works".to_string()),
        status: RegistrationStatus::Pending.as_str().to_string(),
        payment_evidence: payment_evidence.map(str::to_string),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn auth(id: Uuid, role: Role) -> AuthUser {
    AuthUser {
        id,
        role: Some(role),
    }
}

pub fn state(repo: InMemoryRepo, storage: MockStorageService) -> AppState {
    AppState {
        repo: Arc::new(repo),
        storage: Arc::new(storage),
        config: AppConfig::default(),
        rbac: Arc::new(PermissionTable::builtin()),
    }
}

/// Like `state`, but keeps a handle on the repository for assertions.
pub fn state_with_handle(
    repo: InMemoryRepo,
    storage: MockStorageService,
) -> (AppState, Arc<InMemoryRepo>) {
    let repo = Arc::new(repo);
    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(storage),
        config: AppConfig::default(),
        rbac: Arc::new(PermissionTable::builtin()),
    };
    (state, repo)
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    async fn create_user(&self, new_user: User) -> Option<User> {
        self.users.lock().unwrap().push(new_user.clone());
        Some(new_user)
    }

    async fn list_users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let found = users.iter_mut().find(|u| u.id == id)?;
        found.role = role.as_str().to_string();
        Some(found.clone())
    }

    async fn get_published_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_published)
            .cloned()
            .collect()
    }

    async fn get_all_events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    async fn get_published_event(&self, id: Uuid) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id && e.is_published)
            .cloned()
    }

    async fn create_event(&self, req: CreateEventRequest, created_by: Uuid) -> Option<Event> {
        let created = Event {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            location: req.location,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            price_cents: req.price_cents,
            capacity: req.capacity,
            is_published: false,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.events.lock().unwrap().push(created.clone());
        Some(created)
    }

    async fn update_event(&self, id: Uuid, req: UpdateEventRequest) -> Option<Event> {
        let mut events = self.events.lock().unwrap();
        let found = events.iter_mut().find(|e| e.id == id)?;
        if let Some(title) = req.title {
            found.title = title;
        }
        if let Some(description) = req.description {
            found.description = description;
        }
        if let Some(location) = req.location {
            found.location = location;
        }
        if let Some(starts_at) = req.starts_at {
            found.starts_at = starts_at;
        }
        if req.ends_at.is_some() {
            found.ends_at = req.ends_at;
        }
        if let Some(price_cents) = req.price_cents {
            found.price_cents = price_cents;
        }
        if req.capacity.is_some() {
            found.capacity = req.capacity;
        }
        if let Some(is_published) = req.is_published {
            found.is_published = is_published;
        }
        Some(found.clone())
    }

    async fn delete_event(&self, id: Uuid) -> bool {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        events.len() != before
    }

    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        req: CreateRegistrationRequest,
    ) -> Option<Registration> {
        self.get_published_event(event_id).await?;
        let created = Registration {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            organization: req.organization,
            status: RegistrationStatus::Pending.as_str().to_string(),
            payment_evidence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.registrations.lock().unwrap().push(created.clone());
        Some(created)
    }

    async fn get_registration(&self, id: Uuid) -> Option<Registration> {
        self.registration(id)
    }

    async fn get_my_registrations(&self, user_id: Uuid) -> Vec<Registration> {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn get_all_registrations(&self, event_id: Option<Uuid>) -> Vec<Registration> {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| event_id.is_none_or(|id| r.event_id == id))
            .cloned()
            .collect()
    }

    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Option<Registration> {
        let mut registrations = self.registrations.lock().unwrap();
        let found = registrations.iter_mut().find(|r| r.id == id)?;
        found.status = status.as_str().to_string();
        Some(found.clone())
    }

    async fn set_payment_evidence(
        &self,
        id: Uuid,
        user_id: Uuid,
        path: String,
    ) -> Option<Registration> {
        let mut registrations = self.registrations.lock().unwrap();
        let found = registrations
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)?;
        found.payment_evidence = Some(path);
        Some(found.clone())
    }

    async fn get_finance_records(&self) -> Vec<FinanceRecord> {
        let events = self.events.lock().unwrap().clone();
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| {
                let event = events.iter().find(|e| e.id == r.event_id)?;
                Some(FinanceRecord {
                    registration_id: r.id,
                    event_id: r.event_id,
                    event_title: event.title.clone(),
                    full_name: r.full_name.clone(),
                    email: r.email.clone(),
                    organization: r.organization.clone(),
                    status: r.status.clone(),
                    price_cents: event.price_cents,
                    has_evidence: r.payment_evidence.is_some(),
                    created_at: r.created_at,
                })
            })
            .collect()
    }

    async fn subscribe_newsletter(&self, email: String) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap();
        if subscribers.iter().any(|s| s.email == email) {
            return false;
        }
        subscribers.push(NewsletterSubscriber {
            id: Uuid::new_v4(),
            email,
            created_at: Utc::now(),
        });
        true
    }

    async fn get_newsletter_subscribers(&self) -> Vec<NewsletterSubscriber> {
        self.subscribers.lock().unwrap().clone()
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let events = self.events.lock().unwrap();
        let registrations = self.registrations.lock().unwrap();
        AdminDashboardStats {
            total_events: events.len() as i64,
            published_events: events.iter().filter(|e| e.is_published).count() as i64,
            total_registrations: registrations.len() as i64,
            pending_registrations: registrations
                .iter()
                .filter(|r| r.status == RegistrationStatus::Pending.as_str())
                .count() as i64,
            total_users: self.users.lock().unwrap().len() as i64,
            newsletter_subscribers: self.subscribers.lock().unwrap().len() as i64,
        }
    }
}
