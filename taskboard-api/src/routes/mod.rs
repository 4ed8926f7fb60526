/// API route handlers
///
/// - `health`: Health check endpoint
/// - `tasks`: Task CRUD under `/api/tasks/`
/// - `labels`: Label CRUD under `/api/labels/`

pub mod health;
pub mod labels;
pub mod tasks;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;
use taskboard_shared::auth::{
    authorization::{reject_foreign_owner, resolve_owner, AuthzError},
    middleware::AuthContext,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `owner` field of a write body
///
/// Clients may echo their own ID back. Any other value, UUID or not, is an
/// attempt to write as someone else.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PayloadOwner {
    Id(Uuid),
    Other(serde_json::Value),
}

/// Effective owner of a write: always the caller
///
/// # Errors
///
/// Returns `AuthzError::OwnerMismatch` if `owner` names anyone else
pub fn payload_owner(auth: &AuthContext, owner: Option<&PayloadOwner>) -> Result<Uuid, AuthzError> {
    match owner {
        None => resolve_owner(auth, None),
        Some(PayloadOwner::Id(id)) => resolve_owner(auth, Some(*id)),
        Some(PayloadOwner::Other(value)) => Err(reject_foreign_owner(auth, value)),
    }
}

/// Numeric `:id` path segment
///
/// An ID that does not parse can never name an existing row, so it is
/// answered with the same 404 as a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound("Resource not found".to_string()))?;

        Ok(ResourceId(id))
    }
}
