/// Label endpoints
///
/// All endpoints require a bearer token and only ever see the caller's labels.
///
/// # Endpoints
///
/// - `GET /api/labels/` - List labels (`search`, `limit`, `offset`)
/// - `POST /api/labels/` - Create label
/// - `GET /api/labels/:id/` - Retrieve label
/// - `PUT /api/labels/:id/` - Rename label (`name` required)
/// - `PATCH /api/labels/:id/` - Rename label (`name` optional)
/// - `DELETE /api/labels/:id/` - Delete label, detaching it from tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{payload_owner, PayloadOwner, ResourceId},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{authorized_scope, AuthScope, ResourceKind},
        middleware::AuthContext,
    },
    models::label::{Label, LabelFilter},
    store::{validate_label, StoreError},
    validation::reject_null_characters,
};
use uuid::Uuid;
use validator::Validate;

/// Label list query string
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LabelListQuery {
    /// Case-insensitive substring of the name
    #[validate(length(max = 255, message = "Search must be at most 255 characters"))]
    pub search: Option<String>,

    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "Offset cannot be negative"))]
    pub offset: Option<i64>,
}

impl From<LabelListQuery> for LabelFilter {
    fn from(query: LabelListQuery) -> Self {
        LabelFilter {
            search: query.search.filter(|s| !s.is_empty()),
            limit: query.limit,
            offset: query.offset.unwrap_or(0),
        }
    }
}

/// Label create/update body
///
/// `owner` may be sent back unchanged; any other value is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct LabelPayload {
    pub name: Option<String>,
    pub owner: Option<PayloadOwner>,
}

/// Label representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelResponse {
    pub id: i64,
    pub name: String,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
            owner: label.owner_id,
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }
}

fn not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("Label"),
        other => other.into(),
    }
}

/// List the caller's labels
///
/// # Errors
///
/// - `400 Bad Request`: Invalid query string
/// - `401 Unauthorized`: Missing or invalid token
pub async fn list_labels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<LabelListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LabelResponse>>> {
    let Query(query) = query?;
    query.validate()?;
    if let Some(search) = query.search.as_deref() {
        reject_null_characters("search", search)?;
    }

    let scope = authorized_scope(&auth, ResourceKind::Label);
    let labels = state.store.list_labels(scope, &query.into()).await?;

    tracing::debug!(user_id = %auth.user_id, count = labels.len(), "Listed labels");

    Ok(Json(labels.into_iter().map(LabelResponse::from).collect()))
}

/// Retrieve one label
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No such label for this user
pub async fn get_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<LabelResponse>> {
    let scope = authorized_scope(&auth, ResourceKind::Label);
    let label = state.store.get_label(scope, id).await.map_err(not_found)?;

    Ok(Json(label.into()))
}

/// Create a label owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/labels/
/// Authorization: Bearer <jwt_token>
/// Content-Type: application/json
///
/// { "name": "Work" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty, too long, or duplicate name
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: `owner` names another user
pub async fn create_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<LabelPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    let Json(payload) = payload?;
    payload_owner(&auth, payload.owner.as_ref())?;

    let scope = authorized_scope(&auth, ResourceKind::Label);
    let name = validate_label(
        state.store.as_ref(),
        scope,
        payload.name.as_deref().unwrap_or_default(),
        None,
    )
    .await?;

    let label = state.store.create_label(scope, name).await?;

    tracing::info!(label_id = label.id, user_id = %auth.user_id, "Created label");

    Ok((StatusCode::CREATED, Json(label.into())))
}

/// Replace a label (`name` required)
pub async fn replace_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
    payload: Result<Json<LabelPayload>, JsonRejection>,
) -> ApiResult<Json<LabelResponse>> {
    let Json(LabelPayload { name, owner }) = payload?;

    update_label(&state, &auth, id, owner, Some(name.unwrap_or_default())).await
}

/// Partially update a label
pub async fn patch_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
    payload: Result<Json<LabelPayload>, JsonRejection>,
) -> ApiResult<Json<LabelResponse>> {
    let Json(payload) = payload?;

    update_label(&state, &auth, id, payload.owner, payload.name).await
}

/// Shared body of PUT and PATCH
///
/// A foreign `owner` answers 403 before anything is looked up. After that the
/// label is fetched, so a foreign ID answers 404 whatever the name holds.
async fn update_label(
    state: &AppState,
    auth: &AuthContext,
    id: i64,
    owner: Option<PayloadOwner>,
    name: Option<String>,
) -> ApiResult<Json<LabelResponse>> {
    payload_owner(auth, owner.as_ref())?;

    let scope: AuthScope = authorized_scope(auth, ResourceKind::Label);
    let current = state.store.get_label(scope, id).await.map_err(not_found)?;

    let Some(name) = name else {
        return Ok(Json(current.into()));
    };

    let name = validate_label(state.store.as_ref(), scope, &name, Some(id)).await?;
    let label = state
        .store
        .rename_label(scope, id, name)
        .await
        .map_err(not_found)?;

    tracing::info!(label_id = id, user_id = %auth.user_id, "Updated label");

    Ok(Json(label.into()))
}

/// Delete a label
///
/// Tasks that referenced it are kept and simply lose the label.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No such label for this user
pub async fn delete_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let scope = authorized_scope(&auth, ResourceKind::Label);
    state.store.delete_label(scope, id).await.map_err(not_found)?;

    tracing::info!(label_id = id, user_id = %auth.user_id, "Deleted label");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_shared::validation::ValidationError;

    #[test]
    fn test_list_query_validation() {
        assert!(LabelListQuery::default().validate().is_ok());

        let too_many = LabelListQuery {
            limit: Some(501),
            ..Default::default()
        };
        assert!(too_many.validate().is_err());

        let negative = LabelListQuery {
            offset: Some(-1),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let long_search = LabelListQuery {
            search: Some("x".repeat(256)),
            ..Default::default()
        };
        assert!(long_search.validate().is_err());
    }

    #[test]
    fn test_list_query_into_filter() {
        let filter: LabelFilter = LabelListQuery {
            search: Some(String::new()),
            limit: Some(10),
            offset: None,
        }
        .into();

        assert_eq!(filter.search, None);
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn test_label_response_uses_owner_field() {
        let owner_id = Uuid::new_v4();
        let response = LabelResponse::from(Label {
            id: 7,
            name: "Work".to_string(),
            owner_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Work");
        assert_eq!(json["owner"], owner_id.to_string());
        assert!(json.get("owner_id").is_none());
    }

    #[test]
    fn test_not_found_message_names_label() {
        let err = not_found(StoreError::NotFound);
        assert_eq!(err.to_string(), "Not found: Label not found");

        let err = not_found(StoreError::Validation(ValidationError::DuplicateForOwner {
            name: "Work".to_string(),
        }));
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
