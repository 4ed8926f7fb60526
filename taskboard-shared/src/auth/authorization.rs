/// Ownership scoping for tasks and labels
///
/// Every resource belongs to exactly one user and is visible only to that
/// user. Handlers never filter by hand: they derive an [`AuthScope`] from the
/// authenticated caller and pass it to every store operation, which applies
/// `owner_id = scope.owner_id()` before returning or touching a row.
///
/// A row owned by someone else is therefore reported as missing (404), never
/// as forbidden, so callers cannot learn which IDs exist.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{authorized_scope, resolve_owner, ResourceKind};
/// use taskboard_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4());
/// let scope = authorized_scope(&auth, ResourceKind::Task);
/// assert_eq!(scope.owner_id(), auth.user_id);
///
/// // Clients may echo their own ID back, but never someone else's
/// assert!(resolve_owner(&auth, Some(auth.user_id)).is_ok());
/// assert!(resolve_owner(&auth, Some(Uuid::new_v4())).is_err());
/// ```

use std::fmt;

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Write payload named an owner other than the caller
    ///
    /// `requested` is the owner as the client sent it, which need not be a
    /// valid user ID at all.
    #[error("Cannot act on behalf of user {requested}")]
    OwnerMismatch { requested: String },
}

/// Resource types subject to ownership scoping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Task,
    Label,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Task => write!(f, "task"),
            ResourceKind::Label => write!(f, "label"),
        }
    }
}

/// Visibility predicate applied by the store to every read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// Only rows whose `owner_id` equals this user
    Owner(Uuid),
}

impl AuthScope {
    /// User ID every row in scope must be owned by
    pub fn owner_id(&self) -> Uuid {
        match self {
            AuthScope::Owner(id) => *id,
        }
    }

    /// Checks whether a row owned by `owner_id` is visible in this scope
    pub fn permits(&self, owner_id: Uuid) -> bool {
        self.owner_id() == owner_id
    }
}

/// Derives the scope for `auth` operating on `resource`
///
/// Every resource kind is owner-scoped; the kind is carried for tracing.
pub fn authorized_scope(auth: &AuthContext, resource: ResourceKind) -> AuthScope {
    tracing::trace!(user_id = %auth.user_id, %resource, "Resolved owner scope");
    AuthScope::Owner(auth.user_id)
}

/// Determines the effective owner of a write
///
/// The owner is always the caller. A payload that names the caller (or no
/// owner at all) is accepted; naming anyone else is rejected.
///
/// # Errors
///
/// Returns `AuthzError::OwnerMismatch` if `requested` is a different user
pub fn resolve_owner(auth: &AuthContext, requested: Option<Uuid>) -> Result<Uuid, AuthzError> {
    match requested {
        Some(requested) if requested != auth.user_id => {
            tracing::warn!(
                user_id = %auth.user_id,
                requested_owner = %requested,
                "Rejected write on behalf of another user"
            );
            Err(AuthzError::OwnerMismatch {
                requested: requested.to_string(),
            })
        }
        _ => Ok(auth.user_id),
    }
}

/// Rejects a payload owner that is not a user ID
///
/// Such a value can never name the caller, so it is an owner mismatch like
/// any other foreign owner.
pub fn reject_foreign_owner(auth: &AuthContext, requested: impl fmt::Display) -> AuthzError {
    let requested = requested.to_string();
    tracing::warn!(
        user_id = %auth.user_id,
        requested_owner = %requested,
        "Rejected write naming a non-user owner"
    );
    AuthzError::OwnerMismatch { requested }
}
