//! Router assembly.

use axum::{Router, http::HeaderValue, routing::get};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use super::handlers::{AppState, create_task, delete_task, get_task, health_check, update_task};
use super::query::{list_categories, list_tasks, task_stats};

/// Builds the application router.
///
/// Task routes are nested under `/api`; `/health` stays at the root.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let tasks = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/categories", get(list_categories))
        .route("/tasks/stats", get(task_stats))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", tasks)
        .layer(cors)
        .with_state(state)
}

/// CORS policy admitting the given origins with any method and header.
///
/// A `*` entry admits every origin. Origins that are not valid header values
/// are skipped with a warning.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any());

    if origins.iter().any(|origin| origin.as_ref() == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            let origin = origin.as_ref();
            HeaderValue::from_str(origin)
                .inspect_err(|error| tracing::warn!(origin, %error, "Ignoring CORS origin"))
                .ok()
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
