//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod query;
pub mod routes;

pub use dto::{
    CreateTaskRequest, ListTasksQuery, TaskResponse, TaskStatsResponse, UpdateTaskRequest,
    parse_timestamp,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use handlers::{
    AppState, HealthResponse, create_task, delete_task, get_task, health_check, update_task,
};
pub use query::{list_categories, list_tasks, task_stats};
pub use routes::{cors_layer, router};
