/// User model and database operations
///
/// Users are owned by the external identity provider. This service only needs
/// them as the target of the `owner_id` foreign keys on tasks and labels, and
/// to confirm that an authenticated token still refers to a live account.
/// Credentials never reach this table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a user cascades to their tasks, labels, and the junction rows
/// between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// User account as seen by the task tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// When the account was provisioned
    pub created_at: DateTime<Utc>,
}

/// Input for provisioning a user row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name
    pub username: String,
}

impl User {
    /// Provisions a user row
    ///
    /// Called by the identity provider's sync hook and by test fixtures; the
    /// request handlers never create users.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken or the database fails
    pub async fn create(conn: &mut PgConnection, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id, username, created_at
            "#,
        )
        .bind(data.username)
        .fetch_one(conn)
        .await?;

        Ok(user)
    }

    /// Checks whether a user with this ID exists
    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;

        Ok(exists)
    }

    /// Deletes a user by ID
    ///
    /// ⚠️  Cascades to every task and label the user owns.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
