/// Request authentication
///
/// Resolves an inbound request to an [`AuthContext`] or rejects it. The API
/// server's auth layer calls [`authenticate`] and inserts the resulting
/// context into the request extensions, where handlers pick it up with
/// Axum's `Extension` extractor.
///
/// A request is authenticated when:
/// 1. It carries `Authorization: Bearer <token>`
/// 2. The token verifies (see [`super::jwt`])
/// 3. The token's user still exists in the store
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::store::Store;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Token refers to a user that no longer exists
    #[error("Unknown user")]
    UnknownUser,

    /// Store lookup failed
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Extracts the bearer token from the `Authorization` header
///
/// # Errors
///
/// - `MissingCredentials` if the header is absent or not valid text
/// - `InvalidFormat` if the scheme is not `Bearer`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// Returns an [`AuthError`] if the token is missing, malformed, invalid,
/// expired, or refers to a user the store does not know.
pub async fn authenticate(
    store: &dyn Store,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let exists = store
        .user_exists(claims.sub)
        .await
        .map_err(|e| AuthError::StoreError(e.to_string()))?;

    if !exists {
        tracing::warn!(user_id = %claims.sub, "Token for unknown user");
        return Err(AuthError::UnknownUser);
    }

    Ok(AuthContext::new(claims.sub))
}
