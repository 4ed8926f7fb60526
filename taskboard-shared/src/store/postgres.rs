/// PostgreSQL store
///
/// Thin layer over the model queries in [`crate::models`]. Task writes run in
/// a transaction so the row and its label set change together, and label
/// ownership is checked inside that same transaction.
///
/// The per-owner label name rule is enforced by the `labels_owner_name_key`
/// constraint; a unique violation on it is reported as `DuplicateForOwner`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::{first_unowned, Store, StoreError};
use crate::auth::authorization::AuthScope;
use crate::db::pool::health_check;
use crate::models::label::{CreateLabel, Label, LabelFilter, OWNER_NAME_CONSTRAINT};
use crate::models::task::{NewTask, Task, TaskFilter, TaskWithLabels, UpdateTask};
use crate::models::user::User;
use crate::validation::{normalize_label_ids, ValidationError};

/// [`Store`] backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation on the label name constraint to `DuplicateForOwner`
fn label_write_error(err: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(OWNER_NAME_CONSTRAINT) {
            return ValidationError::DuplicateForOwner {
                name: name.to_string(),
            }
            .into();
        }
    }
    StoreError::Database(err)
}

/// Deduplicates `ids` and checks they all belong to `owner_id`
async fn check_label_ids(
    conn: &mut PgConnection,
    owner_id: Uuid,
    ids: &[i64],
) -> Result<Vec<i64>, StoreError> {
    let ids = normalize_label_ids(ids);
    if ids.is_empty() {
        return Ok(ids);
    }

    let owned = Label::owned_ids(conn, owner_id, &ids).await?;
    match first_unowned(&ids, &owned) {
        Some(id) => Err(ValidationError::UnknownLabel { id }.into()),
        None => Ok(ids),
    }
}

/// Attaches labels to each task, preserving task order
async fn attach_labels(
    conn: &mut PgConnection,
    tasks: Vec<Task>,
) -> Result<Vec<TaskWithLabels>, StoreError> {
    let task_ids: Vec<i64> = tasks.iter().map(|task| task.id).collect();
    let mut by_task: HashMap<i64, Vec<Label>> = HashMap::new();

    if !task_ids.is_empty() {
        for row in Label::list_for_tasks(conn, &task_ids).await? {
            by_task.entry(row.task_id).or_default().push(row.label);
        }
    }

    Ok(tasks
        .into_iter()
        .map(|task| {
            let labels = by_task.remove(&task.id).unwrap_or_default();
            TaskWithLabels { task, labels }
        })
        .collect())
}

async fn load_task(
    conn: &mut PgConnection,
    scope: AuthScope,
    id: i64,
) -> Result<TaskWithLabels, StoreError> {
    let task = Task::find_by_id_and_owner(&mut *conn, id, scope.owner_id())
        .await?
        .ok_or(StoreError::NotFound)?;

    attach_labels(conn, vec![task])
        .await?
        .pop()
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(User::exists(&mut conn, user_id).await?)
    }

    async fn list_labels(
        &self,
        scope: AuthScope,
        filter: &LabelFilter,
    ) -> Result<Vec<Label>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Label::list_by_owner(&mut conn, scope.owner_id(), filter).await?)
    }

    async fn get_label(&self, scope: AuthScope, id: i64) -> Result<Label, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Label::find_by_id_and_owner(&mut conn, id, scope.owner_id())
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn label_name_taken(
        &self,
        scope: AuthScope,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Label::name_taken(&mut conn, scope.owner_id(), name, exclude_id).await?)
    }

    async fn create_label(&self, scope: AuthScope, name: String) -> Result<Label, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let data = CreateLabel {
            owner_id: scope.owner_id(),
            name: name.clone(),
        };

        let label = Label::create(&mut conn, data)
            .await
            .map_err(|e| label_write_error(e, &name))?;

        info!(label_id = label.id, owner_id = %label.owner_id, "Label created");
        Ok(label)
    }

    async fn rename_label(
        &self,
        scope: AuthScope,
        id: i64,
        name: String,
    ) -> Result<Label, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let label = Label::rename(&mut conn, id, scope.owner_id(), &name)
            .await
            .map_err(|e| label_write_error(e, &name))?
            .ok_or(StoreError::NotFound)?;

        debug!(label_id = label.id, "Label renamed");
        Ok(label)
    }

    async fn delete_label(&self, scope: AuthScope, id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;

        if !Label::delete_with_owner(&mut conn, id, scope.owner_id()).await? {
            return Err(StoreError::NotFound);
        }

        info!(label_id = id, "Label deleted");
        Ok(())
    }

    async fn list_tasks(
        &self,
        scope: AuthScope,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithLabels>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let tasks = Task::list_by_owner(&mut conn, scope.owner_id(), filter).await?;
        attach_labels(&mut conn, tasks).await
    }

    async fn get_task(&self, scope: AuthScope, id: i64) -> Result<TaskWithLabels, StoreError> {
        let mut conn = self.pool.acquire().await?;
        load_task(&mut conn, scope, id).await
    }

    async fn create_task(&self, scope: AuthScope, task: NewTask) -> Result<TaskWithLabels, StoreError> {
        let owner_id = scope.owner_id();
        let mut tx = self.pool.begin().await?;

        let label_ids = check_label_ids(&mut tx, owner_id, &task.label_ids).await?;
        let row = Task::create(&mut tx, owner_id, &task).await?;
        Task::set_labels(&mut tx, row.id, &label_ids).await?;
        let created = load_task(&mut tx, scope, row.id).await?;

        tx.commit().await?;

        info!(task_id = row.id, owner_id = %owner_id, "Task created");
        Ok(created)
    }

    async fn update_task(
        &self,
        scope: AuthScope,
        id: i64,
        changes: UpdateTask,
    ) -> Result<TaskWithLabels, StoreError> {
        let owner_id = scope.owner_id();
        let mut tx = self.pool.begin().await?;

        // Bumps updated_at and locks the row even when only labels change
        Task::update(&mut tx, id, owner_id, &changes)
            .await?
            .ok_or(StoreError::NotFound)?;

        if let Some(requested) = changes.label_ids.as_deref() {
            let label_ids = check_label_ids(&mut tx, owner_id, requested).await?;
            Task::set_labels(&mut tx, id, &label_ids).await?;
        }

        let updated = load_task(&mut tx, scope, id).await?;
        tx.commit().await?;

        debug!(task_id = id, "Task updated");
        Ok(updated)
    }

    async fn delete_task(&self, scope: AuthScope, id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;

        if !Task::delete_with_owner(&mut conn, id, scope.owner_id()).await? {
            return Err(StoreError::NotFound);
        }

        info!(task_id = id, "Task deleted");
        Ok(())
    }

    async fn count_tasks(&self, scope: AuthScope) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Task::count_by_owner(&mut conn, scope.owner_id()).await?)
    }
}
