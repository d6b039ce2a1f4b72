//! HTTP handlers for task commands.
//!
//! Each handler validates its input, runs the repository calls it needs and
//! maps the outcome to a status code. Mutations log an audit line naming the
//! task title.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use super::dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use super::error::ApiErrorResponse;
use super::extract::{ApiJson, ApiPath};
use crate::domain::TaskId;
use crate::infrastructure::TaskRepository;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Holds a trait object so the backend chosen by `RepositoryFactory` at
/// start-up can be swapped without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Task repository for persistence.
    pub task_repository: Arc<dyn TaskRepository>,
}

impl AppState {
    /// Creates a new `AppState` around a repository.
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self { task_repository }
    }
}

pub(crate) fn not_found(id: TaskId) -> ApiErrorResponse {
    ApiErrorResponse::not_found(format!("Task with ID {id} not found."))
}

// =============================================================================
// GET /tasks/{id} Handler
// =============================================================================

/// Returns a single task.
///
/// # Errors
///
/// - 400 if the id is not an integer
/// - 404 if no task has the id
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = TaskId::new(id);
    let task = state
        .task_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(TaskResponse::from(task)))
}

// =============================================================================
// POST /tasks Handler
// =============================================================================

/// Creates a new task.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Task title",
///   "description": "Optional description",
///   "priority": 3,
///   "category": "Development",
///   "dueDate": "2025-07-01T00:00:00Z"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored task, with `Location: /api/tasks/{id}`
/// - **400 Bad Request**: malformed body or validation error
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on validation or repository failure.
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let new_task = request.validate(Utc::now())?;
    let task = state.task_repository.insert(new_task).await?;

    tracing::info!(task_id = %task.id, title = %task.title, "Created new task");

    let location = format!("/api/tasks/{}", task.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TaskResponse::from(task)),
    ))
}

// =============================================================================
// PUT /tasks/{id} Handler
// =============================================================================

/// Replaces every writable field of a task.
///
/// The body id must match the path id; the check runs before any store
/// access. `completedAt` follows the completion flag: set on the transition
/// to complete, kept while complete, cleared otherwise.
///
/// # Errors
///
/// - 400 `ID_MISMATCH` when the ids differ
/// - 400 `VALIDATION_ERROR` for invalid fields
/// - 404 if no task has the id
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> Result<StatusCode, ApiErrorResponse> {
    if request.id != id {
        return Err(ApiErrorResponse::id_mismatch());
    }

    let id = TaskId::new(id);
    let update = request.validate()?;

    let existing = state
        .task_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let updated = existing.apply_update(update, Utc::now());
    if !state.task_repository.update(&updated).await? {
        return Err(not_found(id));
    }

    tracing::info!(task_id = %id, title = %updated.title, "Updated task");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// DELETE /tasks/{id} Handler
// =============================================================================

/// Deletes a task.
///
/// # Errors
///
/// - 404 if no task has the id
pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = TaskId::new(id);
    let task = state
        .task_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if !state.task_repository.delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(task_id = %id, title = %task.title, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================
