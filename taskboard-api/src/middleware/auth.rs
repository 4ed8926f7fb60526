/// Bearer token authentication layer
///
/// Wraps every `/api` route. Rejects the request with 401 before any handler
/// or extractor runs unless it carries a valid token for a live user, then
/// inserts the [`AuthContext`] into the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskboard_shared::auth::middleware::{authenticate, AuthContext, AuthError};

use crate::{app::AppState, error::ApiError};

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate(state.store.as_ref(), state.jwt_secret(), req.headers())
        .await
        .map_err(|err| {
            match &err {
                AuthError::StoreError(msg) => tracing::error!(error = %msg, "Auth lookup failed"),
                other => tracing::warn!(
                    method = %req.method(),
                    path = %req.uri().path(),
                    reason = %other,
                    "Rejected unauthenticated request"
                ),
            }
            ApiError::from(err)
        })?;

    tracing::Span::current().record("user_id", tracing::field::display(auth.user_id));
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
