//! Repository trait for the task table.
//!
//! Every operation returns a boxed `'static` future, so a call describes the
//! I/O without running it and the trait stays object safe behind
//! `Arc<dyn TaskRepository>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{NewTask, Priority, Task, TaskId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A write violated a column constraint (required field, length limit).
    #[error("Constraint violation: {0}")]
    Validation(String),

    /// A write raced another write to the same row.
    ///
    /// Updates are last-write-wins today, so no backend produces this yet.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Future returned by every repository operation.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

/// Boxes an async block as a [`RepositoryFuture`].
///
/// Fixing the output type here lets `?` inside the block convert into
/// `RepositoryError` without annotations.
pub fn repository_future<T, F>(future: F) -> RepositoryFuture<T>
where
    F: Future<Output = Result<T, RepositoryError>> + Send + 'static,
{
    Box::pin(future)
}

// =============================================================================
// Task Filter
// =============================================================================

/// Equality predicates for listing tasks. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub is_completed: Option<bool>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// A filter that matches every task.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Category predicate; an empty string means no predicate.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|category| !category.is_empty())
    }

    /// Returns true if the task satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let completed_matches = self
            .is_completed
            .is_none_or(|is_completed| task.is_completed == is_completed);
        let category_matches = self
            .category()
            .is_none_or(|category| task.category.as_deref() == Some(category));
        let priority_matches = self
            .priority
            .is_none_or(|priority| task.priority == priority);

        completed_matches && category_matches && priority_matches
    }
}

// =============================================================================
// Task Repository
// =============================================================================

/// Storage for task rows.
pub trait TaskRepository: Send + Sync {
    /// Finds a task by its ID.
    ///
    /// Returns `Ok(None)` if no row has that id.
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>>;

    /// Lists every task matching the filter, newest first.
    ///
    /// Ties on `created_at` are broken by descending id.
    fn list(&self, filter: &TaskFilter) -> RepositoryFuture<Vec<Task>>;

    /// Inserts a task and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Validation` if a column constraint is violated.
    fn insert(&self, task: NewTask) -> RepositoryFuture<Task>;

    /// Overwrites every column of an existing row except `id` and `created_at`.
    ///
    /// Returns `Ok(false)` if the row no longer exists. No version check is
    /// made: the last write wins.
    fn update(&self, task: &Task) -> RepositoryFuture<bool>;

    /// Deletes a task by its ID.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    fn delete(&self, id: TaskId) -> RepositoryFuture<bool>;

    /// Distinct non-empty categories in ascending ordinal order.
    fn distinct_categories(&self) -> RepositoryFuture<Vec<String>>;

    /// Counts the tasks matching the filter.
    fn count(&self, filter: &TaskFilter) -> RepositoryFuture<u64>;
}

// =============================================================================
// Tests
// =============================================================================
