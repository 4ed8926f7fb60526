/// Task model and database operations
///
/// Tasks are per-user to-do items. Each task may be tagged with any number of
/// the owner's labels through the `task_labels` junction table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_labels (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     label_id BIGINT NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```
///
/// There is no lifecycle beyond `is_completed`, which the owner may flip in
/// either direction at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{contains_pattern, label::Label};

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Store-assigned task ID
    pub id: i64,

    /// Title (trimmed, 1-255 characters)
    pub title: String,

    /// Free-form description, may be empty
    pub description: String,

    /// Completion flag
    pub is_completed: bool,

    /// Owning user
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task together with its labels, ordered by label ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithLabels {
    pub task: Task,
    pub labels: Vec<Label>,
}

impl TaskWithLabels {
    /// IDs of the attached labels
    pub fn label_ids(&self) -> Vec<i64> {
        self.labels.iter().map(|label| label.id).collect()
    }
}

/// Input for creating a task
///
/// The owner is not part of the draft: stores take it from the caller's
/// [`crate::auth::authorization::AuthScope`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    /// Validated, trimmed title
    pub title: String,

    pub description: String,

    pub is_completed: bool,

    /// Labels to attach (deduplicated, must belong to the owner)
    pub label_ids: Vec<i64>,
}

/// Input for updating a task
///
/// Only `Some` fields are changed. `label_ids: Some(vec![])` clears all labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    pub label_ids: Option<Vec<i64>>,
}

/// Filters for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Keep only completed (true) or open (false) tasks
    pub is_completed: Option<bool>,

    /// Case-insensitive substring match on the title
    pub search: Option<String>,

    /// Keep only tasks tagged with this label
    pub label_id: Option<i64>,

    /// Maximum number of rows (None = all)
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: i64,
}

impl TaskFilter {
    /// Checks whether a task passes the non-paging filters
    pub fn matches(&self, task: &Task, label_ids: &[i64]) -> bool {
        if let Some(is_completed) = self.is_completed {
            if task.is_completed != is_completed {
                return false;
            }
        }

        if let Some(search) = &self.search {
            if !task.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }

        if let Some(label_id) = self.label_id {
            if !label_ids.contains(&label_id) {
                return false;
            }
        }

        true
    }
}

impl Task {
    /// Inserts a task row for `owner_id` (labels are attached separately)
    pub async fn create(
        conn: &mut PgConnection,
        owner_id: Uuid,
        data: &NewTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description, is_completed)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, is_completed, owner_id, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.is_completed)
        .fetch_one(conn)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID with owner isolation
    pub async fn find_by_id_and_owner(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, is_completed, owner_id, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(conn)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks, ordered by ID
    pub async fn list_by_owner(
        conn: &mut PgConnection,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, is_completed, owner_id, created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
              AND ($2::boolean IS NULL OR is_completed = $2)
              AND ($3::text IS NULL OR title ILIKE $3)
              AND ($4::bigint IS NULL OR EXISTS (
                    SELECT 1 FROM task_labels tl
                    WHERE tl.task_id = tasks.id AND tl.label_id = $4
                  ))
            ORDER BY id ASC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(owner_id)
        .bind(filter.is_completed)
        .bind(filter.search.as_deref().map(contains_pattern))
        .bind(filter.label_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(conn)
        .await?;

        Ok(tasks)
    }

    /// Applies the row-level fields of `data` with owner isolation
    ///
    /// Returns None if the task does not exist for this owner.
    pub async fn update(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                is_completed = COALESCE($5, is_completed),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, description, is_completed, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.title.as_deref())
        .bind(data.description.as_deref())
        .bind(data.is_completed)
        .fetch_optional(conn)
        .await?;

        Ok(task)
    }

    /// Replaces the set of labels attached to a task
    pub async fn set_labels(
        conn: &mut PgConnection,
        task_id: i64,
        label_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        if !label_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO task_labels (task_id, label_id)
                SELECT $1, UNNEST($2::bigint[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(task_id)
            .bind(label_ids)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Deletes a task with owner isolation
    ///
    /// Junction rows cascade; the labels themselves are kept.
    pub async fn delete_with_owner(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts an owner's tasks
    pub async fn count_by_owner(conn: &mut PgConnection, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }
}
