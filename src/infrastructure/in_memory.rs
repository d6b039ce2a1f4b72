//! In-memory repository implementation.
//!
//! Rows live in a `BTreeMap` keyed by id behind a tokio `RwLock`. The same
//! column constraints as the SQL schema are checked on write, so handlers
//! behave identically against either backend. Suitable for tests and local
//! development.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use crate::domain::{NewTask, Task, TaskId, check_column_constraints};
use crate::infrastructure::{
    RepositoryError, RepositoryFuture, TaskFilter, TaskRepository, repository_future,
};

/// In-memory implementation of `TaskRepository`.
///
/// Ids are handed out from a counter starting at 1 and never reused.
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTaskRepository::new();
/// let task = repository.insert(new_task).await?;
/// let found = repository.find_by_id(task.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<BTreeMap<TaskId, Task>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn constraint_error(message: String) -> RepositoryError {
    RepositoryError::Validation(message)
}

/// Newest first; equal timestamps fall back to the higher id.
fn newest_first(left: &Task, right: &Task) -> std::cmp::Ordering {
    right
        .created_at
        .cmp(&left.created_at)
        .then_with(|| right.id.cmp(&left.id))
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>> {
        let tasks = Arc::clone(&self.tasks);
        repository_future(async move {
            let guard = tasks.read().await;
            Ok(guard.get(&id).cloned())
        })
    }

    fn list(&self, filter: &TaskFilter) -> RepositoryFuture<Vec<Task>> {
        let tasks = Arc::clone(&self.tasks);
        let filter = filter.clone();
        repository_future(async move {
            let guard = tasks.read().await;
            let mut matching: Vec<Task> = guard
                .values()
                .filter(|task| filter.matches(task))
                .cloned()
                .collect();
            matching.sort_by(newest_first);
            Ok(matching)
        })
    }

    fn insert(&self, task: NewTask) -> RepositoryFuture<Task> {
        let tasks = Arc::clone(&self.tasks);
        let next_id = Arc::clone(&self.next_id);
        repository_future(async move {
            check_column_constraints(
                &task.title,
                task.description.as_deref(),
                task.category.as_deref(),
            )
            .map_err(constraint_error)?;

            let mut guard = tasks.write().await;
            let id = TaskId::new(next_id.fetch_add(1, Ordering::SeqCst));
            let stored = Task::from_new(id, task);
            guard.insert(id, stored.clone());
            Ok(stored)
        })
    }

    fn update(&self, task: &Task) -> RepositoryFuture<bool> {
        let tasks = Arc::clone(&self.tasks);
        let task = task.clone();
        repository_future(async move {
            check_column_constraints(
                &task.title,
                task.description.as_deref(),
                task.category.as_deref(),
            )
            .map_err(constraint_error)?;

            let mut guard = tasks.write().await;
            let Some(existing) = guard.get_mut(&task.id) else {
                return Ok(false);
            };
            *existing = Task {
                id: existing.id,
                created_at: existing.created_at,
                ..task
            };
            Ok(true)
        })
    }

    fn delete(&self, id: TaskId) -> RepositoryFuture<bool> {
        let tasks = Arc::clone(&self.tasks);
        repository_future(async move {
            let mut guard = tasks.write().await;
            Ok(guard.remove(&id).is_some())
        })
    }

    fn distinct_categories(&self) -> RepositoryFuture<Vec<String>> {
        let tasks = Arc::clone(&self.tasks);
        repository_future(async move {
            let guard = tasks.read().await;
            let categories: BTreeSet<String> = guard
                .values()
                .filter_map(Task::category)
                .map(str::to_string)
                .collect();
            Ok(categories.into_iter().collect())
        })
    }

    fn count(&self, filter: &TaskFilter) -> RepositoryFuture<u64> {
        let tasks = Arc::clone(&self.tasks);
        let filter = filter.clone();
        repository_future(async move {
            let guard = tasks.read().await;
            let count = guard.values().filter(|task| filter.matches(task)).count();
            Ok(u64::try_from(count).unwrap_or(u64::MAX))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskUpdate};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn new_task(title: &str, category: Option<&str>, minutes: i64) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            category: category.map(str::to_string),
            due_date: None,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    #[fixture]
    fn repository() -> InMemoryTaskRepository {
        InMemoryTaskRepository::new()
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_sequential_ids(repository: InMemoryTaskRepository) {
        let first = repository.insert(new_task("a", None, 0)).await.unwrap();
        let second = repository.insert(new_task("b", None, 1)).await.unwrap();

        assert_eq!(first.id, TaskId::new(1));
        assert_eq!(second.id, TaskId::new(2));
        assert!(!first.is_completed);
        assert!(first.completed_at.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_rejects_oversized_title(repository: InMemoryTaskRepository) {
        let result = repository
            .insert(new_task(&"x".repeat(201), None, 0))
            .await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
        assert_eq!(repository.count(&TaskFilter::all()).await.unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_by_id(repository: InMemoryTaskRepository) {
        let created = repository.insert(new_task("a", None, 0)).await.unwrap();

        let found = repository.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));

        let missing = repository.find_by_id(TaskId::new(99)).await.unwrap();
        assert!(missing.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_orders_newest_first(repository: InMemoryTaskRepository) {
        repository.insert(new_task("old", None, 0)).await.unwrap();
        repository.insert(new_task("new", None, 30)).await.unwrap();
        repository.insert(new_task("middle", None, 10)).await.unwrap();

        let titles: Vec<String> = repository
            .list(&TaskFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();

        assert_eq!(titles, vec!["new", "middle", "old"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_applies_filter(repository: InMemoryTaskRepository) {
        let done = repository
            .insert(new_task("done dev", Some("Development"), 0))
            .await
            .unwrap();
        repository
            .insert(new_task("open dev", Some("Development"), 1))
            .await
            .unwrap();
        repository
            .insert(new_task("learning", Some("Learning"), 2))
            .await
            .unwrap();

        let completed = done.clone().apply_update(
            TaskUpdate {
                title: done.title.clone(),
                description: None,
                is_completed: true,
                priority: done.priority,
                category: done.category.clone(),
                due_date: None,
            },
            base_time(),
        );
        assert!(repository.update(&completed).await.unwrap());

        let filter = TaskFilter::all()
            .with_completed(true)
            .with_category("Development");
        let tasks = repository.list(&filter).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "done dev");
        assert_eq!(repository.count(&filter).await.unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_preserves_id_and_created_at(repository: InMemoryTaskRepository) {
        let created = repository.insert(new_task("a", None, 0)).await.unwrap();

        let mut changed = created.clone();
        changed.title = "renamed".to_string();
        changed.created_at = base_time() + Duration::days(3);

        assert!(repository.update(&changed).await.unwrap());

        let stored = repository.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "renamed");
        assert_eq!(stored.created_at, created.created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_missing_row(repository: InMemoryTaskRepository) {
        let ghost = Task::from_new(TaskId::new(42), new_task("ghost", None, 0));
        assert!(!repository.update(&ghost).await.unwrap());
        assert_eq!(repository.count(&TaskFilter::all()).await.unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete(repository: InMemoryTaskRepository) {
        let created = repository.insert(new_task("a", None, 0)).await.unwrap();

        assert!(!repository.delete(TaskId::new(99)).await.unwrap());
        assert_eq!(repository.count(&TaskFilter::all()).await.unwrap(), 1);

        assert!(repository.delete(created.id).await.unwrap());
        assert!(repository.find_by_id(created.id).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_distinct_categories(repository: InMemoryTaskRepository) {
        for (index, category) in [
            Some("Learning"),
            Some("Development"),
            None,
            Some(""),
            Some("Development"),
            Some("development"),
        ]
        .into_iter()
        .enumerate()
        {
            let minutes = i64::try_from(index).unwrap();
            repository
                .insert(new_task("t", category, minutes))
                .await
                .unwrap();
        }

        let categories = repository.distinct_categories().await.unwrap();
        assert_eq!(categories, vec!["Development", "Learning", "development"]);
    }
}
