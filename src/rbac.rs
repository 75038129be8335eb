//! Role-based access control.
//!
//! Every authorization decision in the portal goes through a [`PermissionTable`]:
//! a static mapping from [`Role`] to the ordered set of [`Permission`] tokens that
//! role holds. The table is data, not code. The built-in policy lives in
//! [`PermissionTable::builtin`], and a JSON policy document can replace it at
//! startup (`RBAC_POLICY_PATH`) without touching any call site.
//!
//! Queries never fail. A missing role, an unrecognized role string or an
//! unrecognized permission token all resolve to "deny".

use std::{collections::HashMap, fmt, fs, str::FromStr, sync::LazyLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// RbacError
///
/// Raised only while loading a policy document. Query-time checks never error.
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("failed to read permission policy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid permission policy: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
}

/// Role
///
/// The four account roles. Stored as its snake_case name in `profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    SuperAdmin,
    FinancePerson,
    EventManager,
    OrdinaryUser,
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::FinancePerson,
        Role::EventManager,
        Role::OrdinaryUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::FinancePerson => "finance_person",
            Role::EventManager => "event_manager",
            Role::OrdinaryUser => "ordinary_user",
        }
    }

    /// Parses a stored role name. Anything unrecognized is `None`, which every
    /// check in this module treats as "no permissions".
    pub fn parse(value: &str) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.as_str() == value)
    }

    /// Privilege level in the role hierarchy.
    ///
    /// `ordinary_user(1) < event_manager(2) < finance_person(3) < super_admin(4)`.
    /// This ordering is independent of the permission table; the test suite
    /// checks that the two stay consistent.
    pub fn level(&self) -> u8 {
        match self {
            Role::OrdinaryUser => 1,
            Role::EventManager => 2,
            Role::FinancePerson => 3,
            Role::SuperAdmin => 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| RbacError::UnknownRole(s.to_string()))
    }
}

/// Permission
///
/// Capability tokens, grouped by subject area. The wire form is the dotted
/// token (`events.create`), used both in policy documents and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Permission {
    #[serde(rename = "users.view")]
    UsersView,
    #[serde(rename = "users.create")]
    UsersCreate,
    #[serde(rename = "users.update")]
    UsersUpdate,
    #[serde(rename = "users.delete")]
    UsersDelete,
    #[serde(rename = "users.assign_roles")]
    UsersAssignRoles,

    #[serde(rename = "events.view")]
    EventsView,
    #[serde(rename = "events.create")]
    EventsCreate,
    #[serde(rename = "events.update")]
    EventsUpdate,
    #[serde(rename = "events.delete")]
    EventsDelete,
    #[serde(rename = "events.publish")]
    EventsPublish,

    #[serde(rename = "registrations.view_own")]
    RegistrationsViewOwn,
    #[serde(rename = "registrations.create")]
    RegistrationsCreate,
    #[serde(rename = "registrations.upload_evidence")]
    RegistrationsUploadEvidence,
    #[serde(rename = "registrations.view_all")]
    RegistrationsViewAll,
    #[serde(rename = "registrations.update")]
    RegistrationsUpdate,
    #[serde(rename = "registrations.delete")]
    RegistrationsDelete,
    #[serde(rename = "registrations.approve")]
    RegistrationsApprove,
    #[serde(rename = "registrations.view_evidence")]
    RegistrationsViewEvidence,

    #[serde(rename = "finance.view")]
    FinanceView,
    #[serde(rename = "finance.export")]
    FinanceExport,
    #[serde(rename = "finance.verify_payments")]
    FinanceVerifyPayments,

    #[serde(rename = "admin.dashboard")]
    AdminDashboard,
    #[serde(rename = "admin.settings")]
    AdminSettings,

    #[serde(rename = "newsletter.subscribe")]
    NewsletterSubscribe,
    #[serde(rename = "newsletter.view")]
    NewsletterView,
    #[serde(rename = "newsletter.manage")]
    NewsletterManage,
    #[serde(rename = "newsletter.export")]
    NewsletterExport,
}

impl Permission {
    pub const ALL: [Permission; 27] = [
        Permission::UsersView,
        Permission::UsersCreate,
        Permission::UsersUpdate,
        Permission::UsersDelete,
        Permission::UsersAssignRoles,
        Permission::EventsView,
        Permission::EventsCreate,
        Permission::EventsUpdate,
        Permission::EventsDelete,
        Permission::EventsPublish,
        Permission::RegistrationsViewOwn,
        Permission::RegistrationsCreate,
        Permission::RegistrationsUploadEvidence,
        Permission::RegistrationsViewAll,
        Permission::RegistrationsUpdate,
        Permission::RegistrationsDelete,
        Permission::RegistrationsApprove,
        Permission::RegistrationsViewEvidence,
        Permission::FinanceView,
        Permission::FinanceExport,
        Permission::FinanceVerifyPayments,
        Permission::AdminDashboard,
        Permission::AdminSettings,
        Permission::NewsletterSubscribe,
        Permission::NewsletterView,
        Permission::NewsletterManage,
        Permission::NewsletterExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UsersView => "users.view",
            Permission::UsersCreate => "users.create",
            Permission::UsersUpdate => "users.update",
            Permission::UsersDelete => "users.delete",
            Permission::UsersAssignRoles => "users.assign_roles",
            Permission::EventsView => "events.view",
            Permission::EventsCreate => "events.create",
            Permission::EventsUpdate => "events.update",
            Permission::EventsDelete => "events.delete",
            Permission::EventsPublish => "events.publish",
            Permission::RegistrationsViewOwn => "registrations.view_own",
            Permission::RegistrationsCreate => "registrations.create",
            Permission::RegistrationsUploadEvidence => "registrations.upload_evidence",
            Permission::RegistrationsViewAll => "registrations.view_all",
            Permission::RegistrationsUpdate => "registrations.update",
            Permission::RegistrationsDelete => "registrations.delete",
            Permission::RegistrationsApprove => "registrations.approve",
            Permission::RegistrationsViewEvidence => "registrations.view_evidence",
            Permission::FinanceView => "finance.view",
            Permission::FinanceExport => "finance.export",
            Permission::FinanceVerifyPayments => "finance.verify_payments",
            Permission::AdminDashboard => "admin.dashboard",
            Permission::AdminSettings => "admin.settings",
            Permission::NewsletterSubscribe => "newsletter.subscribe",
            Permission::NewsletterView => "newsletter.view",
            Permission::NewsletterManage => "newsletter.manage",
            Permission::NewsletterExport => "newsletter.export",
        }
    }

    /// Exact token match only. No wildcards, no case folding.
    pub fn parse(value: &str) -> Option<Permission> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s).ok_or_else(|| RbacError::UnknownPermission(s.to_string()))
    }
}

/// RolePermissions
///
/// One row of the active table, as exposed on `GET /admin/roles`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RolePermissions {
    pub role: Role,
    pub level: u8,
    pub permissions: Vec<Permission>,
}

const EVENT_MANAGEMENT: &[Permission] = &[
    Permission::EventsCreate,
    Permission::EventsUpdate,
    Permission::EventsDelete,
];
const USER_MANAGEMENT: &[Permission] = &[
    Permission::UsersCreate,
    Permission::UsersUpdate,
    Permission::UsersDelete,
];
const FINANCE_MANAGEMENT: &[Permission] = &[
    Permission::FinanceView,
    Permission::FinanceExport,
    Permission::FinanceVerifyPayments,
];
const REGISTRATION_MANAGEMENT: &[Permission] = &[
    Permission::RegistrationsUpdate,
    Permission::RegistrationsDelete,
    Permission::RegistrationsApprove,
];

/// PermissionTable
///
/// The immutable role → permissions mapping. Built once at process start and
/// shared through `AppState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<Role, Vec<Permission>>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PermissionTable {
    /// Builds a table from explicit grants. Duplicate permissions collapse,
    /// keeping first-listed order. Roles left out hold nothing.
    pub fn new<I>(grants: I) -> Self
    where
        I: IntoIterator<Item = (Role, Vec<Permission>)>,
    {
        let grants = grants
            .into_iter()
            .map(|(role, permissions)| {
                let mut ordered: Vec<Permission> = Vec::with_capacity(permissions.len());
                for permission in permissions {
                    if !ordered.contains(&permission) {
                        ordered.push(permission);
                    }
                }
                (role, ordered)
            })
            .collect();
        Self { grants }
    }

    /// The organization's default access policy.
    pub fn builtin() -> Self {
        use Permission::*;

        Self::new([
            (Role::SuperAdmin, Permission::ALL.to_vec()),
            (
                Role::FinancePerson,
                vec![
                    AdminDashboard,
                    UsersView,
                    EventsView,
                    RegistrationsViewOwn,
                    RegistrationsCreate,
                    RegistrationsUploadEvidence,
                    RegistrationsViewAll,
                    RegistrationsApprove,
                    RegistrationsViewEvidence,
                    FinanceView,
                    FinanceExport,
                    FinanceVerifyPayments,
                    NewsletterSubscribe,
                ],
            ),
            (
                Role::EventManager,
                vec![
                    AdminDashboard,
                    EventsView,
                    EventsCreate,
                    EventsUpdate,
                    EventsPublish,
                    RegistrationsViewOwn,
                    RegistrationsCreate,
                    RegistrationsUploadEvidence,
                    RegistrationsViewAll,
                    RegistrationsUpdate,
                    NewsletterSubscribe,
                    NewsletterView,
                ],
            ),
            (
                Role::OrdinaryUser,
                vec![
                    EventsView,
                    RegistrationsViewOwn,
                    RegistrationsCreate,
                    RegistrationsUploadEvidence,
                    NewsletterSubscribe,
                ],
            ),
        ])
    }

    /// Parses a JSON policy document of the form
    /// `{"super_admin": ["users.view", ...], ...}`.
    ///
    /// Unknown role keys or permission tokens reject the whole document.
    pub fn from_json_str(json: &str) -> Result<Self, RbacError> {
        let grants: HashMap<Role, Vec<Permission>> = serde_json::from_str(json)?;
        Ok(Self::new(grants))
    }

    /// Loads the policy at `path`, or the built-in policy when no path is configured.
    pub fn load(path: Option<&str>) -> Result<Self, RbacError> {
        match path {
            None => Ok(Self::builtin()),
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|source| RbacError::Io {
                    path: path.to_string(),
                    source,
                })?;
                let table = Self::from_json_str(&json)?;
                tracing::info!(policy = %path, "Loaded permission policy from file");
                Ok(table)
            }
        }
    }

    /// Serializes the table back to the JSON policy format.
    pub fn to_json(&self) -> Result<String, RbacError> {
        let ordered: Vec<(Role, &Vec<Permission>)> = Role::ALL
            .into_iter()
            .filter_map(|role| self.grants.get(&role).map(|perms| (role, perms)))
            .collect();
        let mut map = serde_json::Map::new();
        for (role, perms) in ordered {
            map.insert(role.as_str().to_string(), serde_json::to_value(perms)?);
        }
        Ok(serde_json::to_string_pretty(&map)?)
    }

    /// Rows for every role, highest privilege first.
    pub fn rows(&self) -> Vec<RolePermissions> {
        Role::ALL
            .into_iter()
            .map(|role| RolePermissions {
                role,
                level: role.level(),
                permissions: self.get_role_permissions(Some(role)).to_vec(),
            })
            .collect()
    }

    // --- Primitives ---

    pub fn has_permission(&self, role: Option<Role>, permission: Permission) -> bool {
        let Some(role) = role else {
            return false;
        };
        self.grants
            .get(&role)
            .is_some_and(|perms| perms.contains(&permission))
    }

    /// At least one of `permissions` is held. An empty list is `false`.
    pub fn has_any_permission(&self, role: Option<Role>, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(role, *p))
    }

    /// Every one of `permissions` is held.
    ///
    /// An empty list is vacuously `true` for any known role. A missing role is
    /// always `false`, even for an empty list.
    pub fn has_all_permissions(&self, role: Option<Role>, permissions: &[Permission]) -> bool {
        role.is_some() && permissions.iter().all(|p| self.has_permission(role, *p))
    }

    pub fn get_role_permissions(&self, role: Option<Role>) -> &[Permission] {
        role.and_then(|r| self.grants.get(&r))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// String entry point for callers holding raw tokens. Any unrecognized
    /// role or permission string is denied.
    pub fn is_allowed(&self, role: Option<&str>, permission: &str) -> bool {
        match Permission::parse(permission) {
            Some(permission) => self.has_permission(role.and_then(Role::parse), permission),
            None => false,
        }
    }

    // --- Derived predicates ---

    pub fn can_access_admin(&self, role: Option<Role>) -> bool {
        self.has_permission(role, Permission::AdminDashboard)
    }

    pub fn can_manage_events(&self, role: Option<Role>) -> bool {
        self.has_any_permission(role, EVENT_MANAGEMENT)
    }

    pub fn can_manage_users(&self, role: Option<Role>) -> bool {
        self.has_any_permission(role, USER_MANAGEMENT)
    }

    pub fn can_manage_finance(&self, role: Option<Role>) -> bool {
        self.has_any_permission(role, FINANCE_MANAGEMENT)
    }

    pub fn can_view_all_registrations(&self, role: Option<Role>) -> bool {
        self.has_permission(role, Permission::RegistrationsViewAll)
    }

    pub fn can_manage_registrations(&self, role: Option<Role>) -> bool {
        self.has_any_permission(role, REGISTRATION_MANAGEMENT)
    }

    /// Only a super admin holding `users.assign_roles` may assign roles.
    /// There is no finer-grained delegation per target role.
    pub fn can_assign_role(&self, acting: Option<Role>, _target: Role) -> bool {
        self.has_permission(acting, Permission::UsersAssignRoles) && acting == Some(Role::SuperAdmin)
    }

    /// The acting role must sit strictly above the target and hold `users.update`.
    pub fn can_manage_role(&self, acting: Option<Role>, target: Option<Role>) -> bool {
        is_higher_role(acting, target) && self.has_permission(acting, Permission::UsersUpdate)
    }
}

// --- Hierarchy ---

/// Level of an optional role; unknown roles sit at 0, below everyone.
pub fn role_level(role: Option<Role>) -> u8 {
    role.map(|r| r.level()).unwrap_or(0)
}

pub fn is_higher_role(a: Option<Role>, b: Option<Role>) -> bool {
    role_level(a) > role_level(b)
}

// --- Process-wide default table ---

static BUILTIN: LazyLock<PermissionTable> = LazyLock::new(PermissionTable::builtin);

/// The built-in policy, for callers that do not carry an `AppState`.
pub fn default_table() -> &'static PermissionTable {
    &BUILTIN
}

pub fn has_permission(role: Option<Role>, permission: Permission) -> bool {
    BUILTIN.has_permission(role, permission)
}

pub fn has_any_permission(role: Option<Role>, permissions: &[Permission]) -> bool {
    BUILTIN.has_any_permission(role, permissions)
}

pub fn has_all_permissions(role: Option<Role>, permissions: &[Permission]) -> bool {
    BUILTIN.has_all_permissions(role, permissions)
}

pub fn get_role_permissions(role: Option<Role>) -> &'static [Permission] {
    BUILTIN.get_role_permissions(role)
}
