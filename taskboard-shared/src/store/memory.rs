/// In-memory store
///
/// Keeps users, labels, tasks and the task-label junction in ordered maps
/// behind a single `tokio::sync::RwLock`. Every write, including the
/// duplicate-name check for labels, happens under one write guard, which
/// gives the same atomicity the PostgreSQL unique constraint provides.
///
/// IDs are assigned from per-table counters starting at 1.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{first_unowned, Store, StoreError};
use crate::auth::authorization::AuthScope;
use crate::models::label::{Label, LabelFilter};
use crate::models::task::{NewTask, Task, TaskFilter, TaskWithLabels, UpdateTask};
use crate::validation::{normalize_label_ids, ValidationError};

#[derive(Debug, Default)]
struct Inner {
    users: HashSet<Uuid>,
    labels: BTreeMap<i64, Label>,
    tasks: BTreeMap<i64, Task>,
    /// (task_id, label_id)
    task_labels: BTreeSet<(i64, i64)>,
    last_label_id: i64,
    last_task_id: i64,
}

impl Inner {
    fn label_in_scope(&self, scope: AuthScope, id: i64) -> Option<&Label> {
        self.labels.get(&id).filter(|label| scope.permits(label.owner_id))
    }

    fn task_in_scope(&self, scope: AuthScope, id: i64) -> Option<&Task> {
        self.tasks.get(&id).filter(|task| scope.permits(task.owner_id))
    }

    fn name_taken(&self, owner_id: Uuid, name: &str, exclude_id: Option<i64>) -> bool {
        self.labels.values().any(|label| {
            label.owner_id == owner_id && label.name == name && Some(label.id) != exclude_id
        })
    }

    fn label_ids_of(&self, task_id: i64) -> Vec<i64> {
        self.task_labels
            .range((task_id, i64::MIN)..=(task_id, i64::MAX))
            .map(|(_, label_id)| *label_id)
            .collect()
    }

    fn with_labels(&self, task: &Task) -> TaskWithLabels {
        let labels = self
            .label_ids_of(task.id)
            .into_iter()
            .filter_map(|label_id| self.labels.get(&label_id).cloned())
            .collect();

        TaskWithLabels {
            task: task.clone(),
            labels,
        }
    }

    /// Deduplicates `ids` and checks every one belongs to `owner_id`
    fn owned_label_ids(&self, owner_id: Uuid, ids: &[i64]) -> Result<Vec<i64>, ValidationError> {
        let ids = normalize_label_ids(ids);
        let owned: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| {
                self.labels
                    .get(id)
                    .is_some_and(|label| label.owner_id == owner_id)
            })
            .collect();

        match first_unowned(&ids, &owned) {
            Some(id) => Err(ValidationError::UnknownLabel { id }),
            None => Ok(ids),
        }
    }

    fn set_labels(&mut self, task_id: i64, label_ids: &[i64]) {
        self.task_labels.retain(|(task, _)| *task != task_id);
        self.task_labels
            .extend(label_ids.iter().map(|label_id| (task_id, *label_id)));
    }
}

/// Process-local [`Store`] implementation
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user so tokens for it authenticate
    pub async fn add_user(&self, user_id: Uuid) {
        self.inner.write().await.users.insert(user_id);
    }

    /// Removes a user and everything they own
    ///
    /// Mirrors the `ON DELETE CASCADE` foreign keys of the SQL schema.
    pub async fn remove_user(&self, user_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.users.remove(&user_id) {
            return false;
        }

        let task_ids: HashSet<i64> = inner
            .tasks
            .values()
            .filter(|task| task.owner_id == user_id)
            .map(|task| task.id)
            .collect();
        let label_ids: HashSet<i64> = inner
            .labels
            .values()
            .filter(|label| label.owner_id == user_id)
            .map(|label| label.id)
            .collect();

        inner.tasks.retain(|id, _| !task_ids.contains(id));
        inner.labels.retain(|id, _| !label_ids.contains(id));
        inner
            .task_labels
            .retain(|(task_id, label_id)| !task_ids.contains(task_id) && !label_ids.contains(label_id));

        true
    }

    /// Total number of tasks across all owners
    pub async fn total_tasks(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    /// Total number of labels across all owners
    pub async fn total_labels(&self) -> usize {
        self.inner.read().await.labels.len()
    }
}

fn page<T>(items: impl Iterator<Item = T>, limit: Option<i64>, offset: i64) -> Vec<T> {
    let skipped = items.skip(usize::try_from(offset).unwrap_or(0));
    match limit {
        Some(limit) => skipped.take(usize::try_from(limit).unwrap_or(0)).collect(),
        None => skipped.collect(),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.contains(&user_id))
    }

    async fn list_labels(
        &self,
        scope: AuthScope,
        filter: &LabelFilter,
    ) -> Result<Vec<Label>, StoreError> {
        let inner = self.inner.read().await;
        let labels = inner
            .labels
            .values()
            .filter(|label| scope.permits(label.owner_id) && filter.matches(label))
            .cloned();

        Ok(page(labels, filter.limit, filter.offset))
    }

    async fn get_label(&self, scope: AuthScope, id: i64) -> Result<Label, StoreError> {
        let inner = self.inner.read().await;
        inner
            .label_in_scope(scope, id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn label_name_taken(
        &self,
        scope: AuthScope,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.name_taken(scope.owner_id(), name, exclude_id))
    }

    async fn create_label(&self, scope: AuthScope, name: String) -> Result<Label, StoreError> {
        let mut inner = self.inner.write().await;
        let owner_id = scope.owner_id();

        if inner.name_taken(owner_id, &name, None) {
            return Err(ValidationError::DuplicateForOwner { name }.into());
        }

        inner.last_label_id += 1;
        let now = Utc::now();
        let label = Label {
            id: inner.last_label_id,
            name,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        inner.labels.insert(label.id, label.clone());

        Ok(label)
    }

    async fn rename_label(
        &self,
        scope: AuthScope,
        id: i64,
        name: String,
    ) -> Result<Label, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.label_in_scope(scope, id).is_none() {
            return Err(StoreError::NotFound);
        }
        if inner.name_taken(scope.owner_id(), &name, Some(id)) {
            return Err(ValidationError::DuplicateForOwner { name }.into());
        }

        let label = inner.labels.get_mut(&id).ok_or(StoreError::NotFound)?;
        label.name = name;
        label.updated_at = Utc::now();

        Ok(label.clone())
    }

    async fn delete_label(&self, scope: AuthScope, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.label_in_scope(scope, id).is_none() {
            return Err(StoreError::NotFound);
        }

        inner.labels.remove(&id);
        inner.task_labels.retain(|(_, label_id)| *label_id != id);

        Ok(())
    }

    async fn list_tasks(
        &self,
        scope: AuthScope,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskWithLabels>, StoreError> {
        let inner = self.inner.read().await;
        let tasks = inner
            .tasks
            .values()
            .filter(|task| {
                scope.permits(task.owner_id) && filter.matches(task, &inner.label_ids_of(task.id))
            })
            .map(|task| inner.with_labels(task));

        Ok(page(tasks, filter.limit, filter.offset))
    }

    async fn get_task(&self, scope: AuthScope, id: i64) -> Result<TaskWithLabels, StoreError> {
        let inner = self.inner.read().await;
        inner
            .task_in_scope(scope, id)
            .map(|task| inner.with_labels(task))
            .ok_or(StoreError::NotFound)
    }

    async fn create_task(&self, scope: AuthScope, task: NewTask) -> Result<TaskWithLabels, StoreError> {
        let mut inner = self.inner.write().await;
        let owner_id = scope.owner_id();
        let label_ids = inner.owned_label_ids(owner_id, &task.label_ids)?;

        inner.last_task_id += 1;
        let now = Utc::now();
        let row = Task {
            id: inner.last_task_id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(row.id, row.clone());
        inner.set_labels(row.id, &label_ids);

        Ok(inner.with_labels(&row))
    }

    async fn update_task(
        &self,
        scope: AuthScope,
        id: i64,
        changes: UpdateTask,
    ) -> Result<TaskWithLabels, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.task_in_scope(scope, id).is_none() {
            return Err(StoreError::NotFound);
        }

        // Check labels before mutating anything
        let label_ids = changes
            .label_ids
            .as_deref()
            .map(|ids| inner.owned_label_ids(scope.owner_id(), ids))
            .transpose()?;

        let task = inner.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(is_completed) = changes.is_completed {
            task.is_completed = is_completed;
        }
        task.updated_at = Utc::now();
        let task = task.clone();

        if let Some(label_ids) = label_ids {
            inner.set_labels(id, &label_ids);
        }

        Ok(inner.with_labels(&task))
    }

    async fn delete_task(&self, scope: AuthScope, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.task_in_scope(scope, id).is_none() {
            return Err(StoreError::NotFound);
        }

        inner.tasks.remove(&id);
        inner.task_labels.retain(|(task_id, _)| *task_id != id);

        Ok(())
    }

    async fn count_tasks(&self, scope: AuthScope) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        let count = inner
            .tasks
            .values()
            .filter(|task| scope.permits(task.owner_id))
            .count();

        Ok(count as i64)
    }
}
