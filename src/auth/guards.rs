//! Authorization predicates.
//!
//! A [`Guard`] is a small expression tree evaluated against the caller. Route-level guards run
//! as middleware after authentication; record-level guards (ownership) are evaluated by the
//! handler once the record's owner is known.

use super::{auth_middleware, AuthError, AuthService, AuthUser};
use crate::entities::UserRole;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use lazy_static::lazy_static;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    HasRole(UserRole),
    /// Caller is the owner recorded on the resource
    OwnsRecord(Option<Uuid>),
    AnyOf(Vec<Guard>),
    AllOf(Vec<Guard>),
}

impl Guard {
    pub fn has_role(role: UserRole) -> Self {
        Guard::HasRole(role)
    }

    pub fn owns_record(owner: Option<Uuid>) -> Self {
        Guard::OwnsRecord(owner)
    }

    pub fn any_of(guards: impl IntoIterator<Item = Guard>) -> Self {
        Guard::AnyOf(guards.into_iter().collect())
    }

    pub fn all_of(guards: impl IntoIterator<Item = Guard>) -> Self {
        Guard::AllOf(guards.into_iter().collect())
    }

    /// Admins, or whoever owns the record.
    pub fn admin_or_owner(owner: Option<Uuid>) -> Self {
        Guard::any_of([Guard::has_role(UserRole::Admin), Guard::owns_record(owner)])
    }

    pub fn allows(&self, user: &AuthUser) -> bool {
        match self {
            Guard::Authenticated => true,
            Guard::HasRole(role) => user.has_role(*role),
            Guard::OwnsRecord(owner) => owner.is_some_and(|id| id == user.user_id),
            Guard::AnyOf(guards) => guards.iter().any(|g| g.allows(user)),
            Guard::AllOf(guards) => guards.iter().all(|g| g.allows(user)),
        }
    }

    pub fn check(&self, user: &AuthUser) -> Result<(), AuthError> {
        if self.allows(user) {
            Ok(())
        } else {
            warn!(user_id = %user.user_id, guard = ?self, "authorization denied");
            Err(AuthError::InsufficientPermissions)
        }
    }
}

lazy_static! {
    pub static ref AUTHENTICATED: Arc<Guard> = Arc::new(Guard::Authenticated);
    pub static ref ADMIN_ONLY: Arc<Guard> = Arc::new(Guard::has_role(UserRole::Admin));
}

async fn guard_middleware(
    State(guard): State<Arc<Guard>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;
    guard.check(user)?;
    Ok(next.run(request).await)
}

/// Router helpers that attach authentication and guards.
pub trait GuardRouterExt {
    /// Requires a valid bearer token on every route.
    fn with_auth(self, auth: Arc<AuthService>) -> Self;
    /// Requires a valid bearer token and `guard` to pass.
    fn with_guard(self, auth: Arc<AuthService>, guard: Arc<Guard>) -> Self;
}

impl<S> GuardRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth: Arc<AuthService>) -> Self {
        self.layer(middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn with_guard(self, auth: Arc<AuthService>, guard: Arc<Guard>) -> Self {
        self.layer(middleware::from_fn_with_state(guard, guard_middleware))
            .with_auth(auth)
    }
}
