/// Label model and database operations
///
/// Labels are per-user tags that tasks can reference. Names are unique per
/// owner, not globally: two users may both have a "Work" label.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT labels_owner_name_key UNIQUE (owner_id, name)
/// );
/// ```
///
/// Every query takes the owner ID so rows belonging to someone else are
/// indistinguishable from rows that do not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use super::contains_pattern;

/// Name of the per-owner uniqueness constraint on `labels`
pub const OWNER_NAME_CONSTRAINT: &str = "labels_owner_name_key";

/// Label owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    /// Store-assigned label ID
    pub id: i64,

    /// Label name (trimmed, 1-255 characters)
    pub name: String,

    /// Owning user
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLabel {
    /// Owner (always the authenticated caller)
    pub owner_id: Uuid,

    /// Validated, trimmed name
    pub name: String,
}

/// Filters for listing labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    /// Case-insensitive substring match on the name
    pub search: Option<String>,

    /// Maximum number of rows (None = all)
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: i64,
}

impl LabelFilter {
    /// Checks whether a label passes the non-paging filters
    pub fn matches(&self, label: &Label) -> bool {
        match &self.search {
            Some(search) => label.name.to_lowercase().contains(&search.to_lowercase()),
            None => true,
        }
    }
}

/// Label joined with the task that references it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskLabelRow {
    pub task_id: i64,

    #[sqlx(flatten)]
    pub label: Label,
}

impl Label {
    /// Inserts a new label
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`OWNER_NAME_CONSTRAINT`] if the owner
    /// already has a label with this name.
    pub async fn create(conn: &mut PgConnection, data: CreateLabel) -> Result<Self, sqlx::Error> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.owner_id)
        .bind(data.name)
        .fetch_one(conn)
        .await?;

        Ok(label)
    }

    /// Finds a label by ID with owner isolation
    pub async fn find_by_id_and_owner(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM labels
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(conn)
        .await?;

        Ok(label)
    }

    /// Lists an owner's labels, ordered by ID
    pub async fn list_by_owner(
        conn: &mut PgConnection,
        owner_id: Uuid,
        filter: &LabelFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let labels = sqlx::query_as::<_, Label>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM labels
            WHERE owner_id = $1
              AND ($2::text IS NULL OR name ILIKE $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(owner_id)
        .bind(filter.search.as_deref().map(contains_pattern))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(conn)
        .await?;

        Ok(labels)
    }

    /// Checks whether the owner already uses `name`, ignoring `exclude_id`
    pub async fn name_taken(
        conn: &mut PgConnection,
        owner_id: Uuid,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM labels
                WHERE owner_id = $1 AND name = $2
                  AND ($3::bigint IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(conn)
        .await?;

        Ok(taken)
    }

    /// Renames a label with owner isolation
    ///
    /// Returns None if the label does not exist for this owner.
    pub async fn rename(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            UPDATE labels
            SET name = $3,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .fetch_optional(conn)
        .await?;

        Ok(label)
    }

    /// Deletes a label with owner isolation
    ///
    /// Junction rows cascade; tasks that referenced the label are kept.
    pub async fn delete_with_owner(
        conn: &mut PgConnection,
        id: i64,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM labels WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the subset of `ids` that the owner actually has
    pub async fn owned_ids(
        conn: &mut PgConnection,
        owner_id: Uuid,
        ids: &[i64],
    ) -> Result<Vec<i64>, sqlx::Error> {
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM labels WHERE owner_id = $1 AND id = ANY($2)",
        )
        .bind(owner_id)
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(owned)
    }

    /// Loads the labels attached to each of the given tasks
    pub async fn list_for_tasks(
        conn: &mut PgConnection,
        task_ids: &[i64],
    ) -> Result<Vec<TaskLabelRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskLabelRow>(
            r#"
            SELECT tl.task_id, l.id, l.name, l.owner_id, l.created_at, l.updated_at
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY tl.task_id ASC, l.id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }
}
