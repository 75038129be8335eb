/// Router Module Index
///
/// Routes are split by access level. Authentication is enforced with a layer
/// on the authenticated router and by the `AuthUser` extractor on every admin
/// handler; permissions are checked inside each handler against the
/// permission table.

/// Routes accessible to anonymous visitors.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;

/// Dashboard routes under `/admin`, gated per handler by permission.
pub mod admin;
