//! Read-only task queries: filtered listing, categories, and statistics.

use axum::{Json, extract::State};

use super::dto::{ListTasksQuery, TaskResponse, TaskStatsResponse};
use super::error::ApiErrorResponse;
use super::extract::ApiQuery;
use super::handlers::AppState;
use crate::domain::TaskStats;
use crate::infrastructure::TaskFilter;

/// Lists tasks, newest first.
///
/// # Query Parameters
///
/// - `isCompleted`: `true` | `false`
/// - `category`: exact, case-sensitive match; empty means no filter
/// - `priority`: `1`-`4` or a priority name
///
/// Every supplied parameter must match. There is no pagination.
///
/// # Errors
///
/// 400 for an unparsable parameter.
pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let filter = TaskFilter::from(query);
    let tasks = state.task_repository.list(&filter).await?;

    tracing::debug!(count = tasks.len(), ?filter, "Listed tasks");
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Lists the distinct non-empty categories in ascending order.
///
/// # Errors
///
/// 500 if the repository fails.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiErrorResponse> {
    let categories = state.task_repository.distinct_categories().await?;
    Ok(Json(categories))
}

/// Returns the completion summary of the whole table.
///
/// # Errors
///
/// 500 if the repository fails.
pub async fn task_stats(
    State(state): State<AppState>,
) -> Result<Json<TaskStatsResponse>, ApiErrorResponse> {
    let total = state.task_repository.count(&TaskFilter::all());
    let completed = state
        .task_repository
        .count(&TaskFilter::all().with_completed(true));
    let (total, completed) = futures::try_join!(total, completed)?;

    Ok(Json(TaskStats::compute(total, completed).into()))
}
