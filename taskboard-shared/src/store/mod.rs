/// Persistence for tasks and labels
///
/// [`Store`] is the seam between request handlers and storage. Every read,
/// update and delete takes an [`AuthScope`], and creates take the scope as the
/// owner, so a handler cannot reach another user's rows even by mistake.
///
/// # Backends
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, used by the server
/// - [`memory::InMemoryStore`]: process-local maps, used by tests
///
/// Both backends enforce the per-owner label name constraint atomically with
/// the write, so two concurrent creates of the same name cannot both succeed.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::AuthScope;
/// use taskboard_shared::store::{memory::InMemoryStore, validate_label, Store};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// let scope = AuthScope::Owner(Uuid::new_v4());
///
/// let name = validate_label(&store, scope, " Work ", None).await?;
/// let label = store.create_label(scope, name).await?;
/// assert_eq!(label.name, "Work");
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::authorization::AuthScope;
use crate::models::label::{Label, LabelFilter};
use crate::models::task::{NewTask, TaskFilter, TaskWithLabels, UpdateTask};
use crate::validation::{validate_label_name, ValidationError};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row does not exist, or exists outside the caller's scope
    #[error("Resource not found")]
    NotFound,

    /// Write rejected by a field or uniqueness rule
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations for the task tracker
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Checks whether a user exists
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError>;

    /// Lists labels in scope, ordered by ID
    async fn list_labels(
        &self,
        scope: AuthScope,
        filter: &LabelFilter,
    ) -> Result<Vec<Label>, StoreError>;

    /// Fetches a label in scope
    async fn get_label(&self, scope: AuthScope, id: i64) -> Result<Label, StoreError>;

    /// Checks whether the scope's owner already has a label called `name`
    ///
    /// `exclude_id` skips one label, so a rename to the current name passes.
    async fn label_name_taken(
        &self,
        scope: AuthScope,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError>;

    /// Creates a label owned by the scope's owner
    ///
    /// Fails with `DuplicateForOwner` if the name is already in use.
    async fn create_label(&self, scope: AuthScope, name: String) -> Result<Label, StoreError>;

    /// Renames a label in scope
    async fn rename_label(
        &self,
        scope: AuthScope,
        id: i64,
        name: String,
    ) -> Result<Label, StoreError>;

    /// Deletes a label in scope, detaching it from every task
    async fn delete_label(&self, scope: AuthScope, id: i64) -> Result<(), StoreError>;

    /// Lists tasks in scope with their labels, ordered by ID
    async fn list_tasks(
        &self,
        scope: AuthScope,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithLabels>, StoreError>;

    /// Fetches a task in scope with its labels
    async fn get_task(&self, scope: AuthScope, id: i64) -> Result<TaskWithLabels, StoreError>;

    /// Creates a task owned by the scope's owner
    ///
    /// Fails with `UnknownLabel` if any label ID is not the owner's.
    async fn create_task(&self, scope: AuthScope, task: NewTask) -> Result<TaskWithLabels, StoreError>;

    /// Updates a task in scope
    ///
    /// Fails with `UnknownLabel` if any new label ID is not the owner's.
    async fn update_task(
        &self,
        scope: AuthScope,
        id: i64,
        changes: UpdateTask,
    ) -> Result<TaskWithLabels, StoreError>;

    /// Deletes a task in scope (its labels are kept)
    async fn delete_task(&self, scope: AuthScope, id: i64) -> Result<(), StoreError>;

    /// Counts tasks in scope
    async fn count_tasks(&self, scope: AuthScope) -> Result<i64, StoreError>;
}

/// Validates a label name for the scope's owner
///
/// Runs the field checks, then the per-owner duplicate check. Returns the
/// trimmed name to persist. `exclude_id` is the label being renamed, if any.
///
/// # Errors
///
/// - `EmptyField` / `TooLong` from [`validate_label_name`]
/// - `DuplicateForOwner` if the owner already has a label with this name
pub async fn validate_label(
    store: &dyn Store,
    scope: AuthScope,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<String, StoreError> {
    let name = validate_label_name(name)?;

    if store.label_name_taken(scope, &name, exclude_id).await? {
        return Err(ValidationError::DuplicateForOwner { name }.into());
    }

    Ok(name)
}

/// Returns the first requested label ID missing from `owned`
pub(crate) fn first_unowned(requested: &[i64], owned: &[i64]) -> Option<i64> {
    requested.iter().copied().find(|id| !owned.contains(id))
}
