//! Client-side mirror of the server's task state.
//!
//! [`TaskStore`] holds the last fetched task list, stats and categories and
//! keeps them in step with the server after each mutation. Views over the
//! list are computed on each call, so they always reflect the current list.

use std::collections::BTreeMap;

use chrono::Utc;

use super::service::{ClientError, TaskApi};
use crate::api::{
    CreateTaskRequest, ListTasksQuery, TaskResponse, TaskStatsResponse, UpdateTaskRequest,
};
use crate::domain::completion_timestamp;

/// Group name for tasks without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Single-writer cache of task state backed by a [`TaskApi`].
#[derive(Debug)]
pub struct TaskStore<A> {
    api: A,
    tasks: Vec<TaskResponse>,
    stats: TaskStatsResponse,
    categories: Vec<String>,
    loading: bool,
    error: Option<String>,
}

impl<A: TaskApi> TaskStore<A> {
    /// Creates an empty store.
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            stats: TaskStatsResponse::default(),
            categories: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tasks(&self) -> &[TaskResponse] {
        &self.tasks
    }

    pub const fn stats(&self) -> &TaskStatsResponse {
        &self.stats
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed action, until cleared.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    pub fn completed_tasks(&self) -> Vec<&TaskResponse> {
        self.tasks.iter().filter(|task| task.is_completed).collect()
    }

    pub fn pending_tasks(&self) -> Vec<&TaskResponse> {
        self.tasks.iter().filter(|task| !task.is_completed).collect()
    }

    /// Tasks grouped by category, keeping list order within each group.
    ///
    /// Absent and empty categories are grouped under [`UNCATEGORIZED`].
    pub fn tasks_by_category(&self) -> BTreeMap<&str, Vec<&TaskResponse>> {
        let mut grouped: BTreeMap<&str, Vec<&TaskResponse>> = BTreeMap::new();
        for task in &self.tasks {
            let category = task
                .category
                .as_deref()
                .filter(|category| !category.is_empty())
                .unwrap_or(UNCATEGORIZED);
            grouped.entry(category).or_default().push(task);
        }
        grouped
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Replaces the local list with the server's filtered list.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also kept in [`TaskStore::error`].
    pub async fn fetch_tasks(&mut self, filters: &ListTasksQuery) -> Result<(), ClientError> {
        self.begin();
        let result = self.api.get_tasks(filters).await;
        let outcome = result.map(|tasks| self.tasks = tasks);
        self.finish("fetch tasks", outcome)
    }

    /// Creates a task and prepends the server's copy to the local list.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also kept in [`TaskStore::error`].
    pub async fn create_task(
        &mut self,
        request: &CreateTaskRequest,
    ) -> Result<TaskResponse, ClientError> {
        self.begin();
        let outcome = match self.api.create_task(request).await {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                self.fetch_stats().await;
                Ok(task)
            }
            Err(error) => Err(error),
        };
        self.finish("create task", outcome)
    }

    /// Sends an update and merges it into the local entry.
    ///
    /// The local entry keeps its `createdAt`; `completedAt` follows the
    /// completion flag as the server applies it.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also kept in [`TaskStore::error`].
    pub async fn update_task(&mut self, request: &UpdateTaskRequest) -> Result<(), ClientError> {
        self.begin();
        let outcome = match self.api.update_task(request).await {
            Ok(()) => {
                if let Some(existing) = self.tasks.iter_mut().find(|task| task.id == request.id) {
                    merge_update(existing, request);
                }
                self.fetch_stats().await;
                Ok(())
            }
            Err(error) => Err(error),
        };
        self.finish("update task", outcome)
    }

    /// Deletes a task and drops it from the local list.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also kept in [`TaskStore::error`].
    pub async fn delete_task(&mut self, id: i64) -> Result<(), ClientError> {
        self.begin();
        let outcome = match self.api.delete_task(id).await {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                self.fetch_stats().await;
                Ok(())
            }
            Err(error) => Err(error),
        };
        self.finish("delete task", outcome)
    }

    /// Flips the completion flag of a listed task.
    ///
    /// Does nothing if `id` is not in the local list.
    ///
    /// # Errors
    ///
    /// See [`TaskStore::update_task`].
    pub async fn toggle_task_completion(&mut self, id: i64) -> Result<(), ClientError> {
        let Some(task) = self.tasks.iter().find(|task| task.id == id) else {
            return Ok(());
        };

        let request = UpdateTaskRequest {
            is_completed: !task.is_completed,
            ..UpdateTaskRequest::from_task(task)
        };
        self.update_task(&request).await
    }

    /// Refreshes the stats. Failures are logged and the old stats kept.
    pub async fn fetch_stats(&mut self) {
        match self.api.get_stats().await {
            Ok(stats) => self.stats = stats,
            Err(error) => tracing::warn!(%error, "Error fetching stats"),
        }
    }

    /// Refreshes the categories. Failures are logged and the old list kept.
    pub async fn fetch_categories(&mut self) {
        match self.api.get_categories().await {
            Ok(categories) => self.categories = categories,
            Err(error) => tracing::warn!(%error, "Error fetching categories"),
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish<T>(
        &mut self,
        action: &str,
        outcome: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        self.loading = false;
        if let Err(error) = &outcome {
            tracing::warn!(%error, "Failed to {action}");
            self.error = Some(error.to_string());
        }
        outcome
    }
}

fn merge_update(existing: &mut TaskResponse, request: &UpdateTaskRequest) {
    existing.completed_at = completion_timestamp(
        existing.is_completed,
        existing.completed_at,
        request.is_completed,
        Utc::now(),
    );
    existing.title.clone_from(&request.title);
    existing.description.clone_from(&request.description);
    existing.is_completed = request.is_completed;
    existing.priority = request.priority;
    existing.category.clone_from(&request.category);
    existing.due_date = request.due_date;
}

// =============================================================================
// Tests
// =============================================================================
