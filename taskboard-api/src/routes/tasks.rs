/// Task endpoints
///
/// All endpoints require a bearer token and only ever see the caller's tasks.
///
/// # Endpoints
///
/// - `GET /api/tasks/` - List tasks (`is_completed`, `search`, `label`, `limit`, `offset`)
/// - `POST /api/tasks/` - Create task
/// - `GET /api/tasks/:id/` - Retrieve task
/// - `PUT /api/tasks/:id/` - Update task (`title` required)
/// - `PATCH /api/tasks/:id/` - Update task (all fields optional)
/// - `DELETE /api/tasks/:id/` - Delete task (its labels are kept)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{labels::LabelResponse, payload_owner, PayloadOwner, ResourceId},
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
        authorization::{authorized_scope, ResourceKind},
        middleware::AuthContext,
    },
    models::task::{NewTask, TaskFilter, TaskWithLabels, UpdateTask},
    store::StoreError,
    validation::{reject_null_characters, validate_task_description, validate_task_title},
};
use uuid::Uuid;
use validator::Validate;

/// Task list query string
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskListQuery {
    pub is_completed: Option<bool>,

    /// Case-insensitive substring of the title
    #[validate(length(max = 255, message = "Search must be at most 255 characters"))]
    pub search: Option<String>,

    /// Only tasks tagged with this label ID
    pub label: Option<i64>,

    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "Offset cannot be negative"))]
    pub offset: Option<i64>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(query: TaskListQuery) -> Self {
        TaskFilter {
            is_completed: query.is_completed,
            search: query.search.filter(|s| !s.is_empty()),
            label_id: query.label,
            limit: query.limit,
            offset: query.offset.unwrap_or(0),
        }
    }
}

/// Task create/update body
///
/// `labels` is a list of the caller's label IDs and replaces the current set
/// when present. `owner` may be sent back unchanged; any other value is
/// rejected.
#[derive(Debug, Default, Deserialize)]
pub struct TaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    pub owner: Option<PayloadOwner>,
    pub labels: Option<Vec<i64>>,
}

impl TaskPayload {
    /// Validates the fields present and builds the store update
    fn into_update(self) -> Result<UpdateTask, ApiError> {
        let title = self
            .title
            .as_deref()
            .map(validate_task_title)
            .transpose()?;
        let description = self
            .description
            .as_deref()
            .map(validate_task_description)
            .transpose()?;

        Ok(UpdateTask {
            title,
            description,
            is_completed: self.is_completed,
            label_ids: self.labels,
        })
    }
}

/// Task representation with nested labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub owner: Uuid,
    pub labels: Vec<LabelResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskWithLabels> for TaskResponse {
    fn from(TaskWithLabels { task, labels }: TaskWithLabels) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            owner: task.owner_id,
            labels: labels.into_iter().map(LabelResponse::from).collect(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

fn not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("Task"),
        other => other.into(),
    }
}

/// List the caller's tasks
///
/// # Errors
///
/// - `400 Bad Request`: Invalid query string
/// - `401 Unauthorized`: Missing or invalid token
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let Query(query) = query?;
    query.validate()?;
    if let Some(search) = query.search.as_deref() {
        reject_null_characters("search", search)?;
    }

    let scope = authorized_scope(&auth, ResourceKind::Task);
    let tasks = state.store.list_tasks(scope, &query.into()).await?;

    tracing::debug!(user_id = %auth.user_id, count = tasks.len(), "Listed tasks");

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Retrieve one task with its labels
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No such task for this user
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<TaskResponse>> {
    let scope = authorized_scope(&auth, ResourceKind::Task);
    let task = state.store.get_task(scope, id).await.map_err(not_found)?;

    tracing::debug!(task_id = id, user_id = %auth.user_id, "Retrieved task");

    Ok(Json(task.into()))
}

/// Create a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks/
/// Authorization: Bearer <jwt_token>
/// Content-Type: application/json
///
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers",
///   "labels": [1, 2]
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the task, its labels nested as full objects.
///
/// # Errors
///
/// - `400 Bad Request`: Empty or too long title, NUL characters, unknown label
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: `owner` names another user
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(payload) = payload?;
    payload_owner(&auth, payload.owner.as_ref())?;

    let title = validate_task_title(payload.title.as_deref().unwrap_or_default())?;
    let description =
        validate_task_description(payload.description.as_deref().unwrap_or_default())?;
    let draft = NewTask {
        title,
        description,
        is_completed: payload.is_completed.unwrap_or(false),
        label_ids: payload.labels.unwrap_or_default(),
    };

    let scope = authorized_scope(&auth, ResourceKind::Task);
    let task = state.store.create_task(scope, draft).await?;

    tracing::info!(
        task_id = task.task.id,
        user_id = %auth.user_id,
        labels = task.labels.len(),
        "Created task"
    );

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Update a task (`title` required)
pub async fn replace_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(mut payload) = payload?;
    payload.title.get_or_insert_with(String::new);

    update_task(&state, &auth, id, payload).await
}

/// Partially update a task
pub async fn patch_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(payload) = payload?;

    update_task(&state, &auth, id, payload).await
}

/// Shared body of PUT and PATCH
///
/// A foreign `owner` answers 403 before anything is looked up. After that the
/// task is fetched, so a foreign ID answers 404 whatever the other fields hold.
async fn update_task(
    state: &AppState,
    auth: &AuthContext,
    id: i64,
    payload: TaskPayload,
) -> ApiResult<Json<TaskResponse>> {
    payload_owner(auth, payload.owner.as_ref())?;

    let scope = authorized_scope(auth, ResourceKind::Task);
    state.store.get_task(scope, id).await.map_err(not_found)?;

    let changes = payload.into_update()?;
    let task = state
        .store
        .update_task(scope, id, changes)
        .await
        .map_err(not_found)?;

    tracing::info!(
        task_id = id,
        user_id = %auth.user_id,
        is_completed = task.task.is_completed,
        "Updated task"
    );

    Ok(Json(task.into()))
}

/// Delete a task
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No such task for this user
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let scope = authorized_scope(&auth, ResourceKind::Task);
    state.store.delete_task(scope, id).await.map_err(not_found)?;

    tracing::info!(task_id = id, user_id = %auth.user_id, "Deleted task");

    Ok(StatusCode::NO_CONTENT)
}
