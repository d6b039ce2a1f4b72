//! HTTP access to the task API.
//!
//! [`TaskApi`] is the seam the client store talks through; [`HttpTaskApi`]
//! implements it with `reqwest` against a running server.

use std::env;

use futures::future::BoxFuture;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{
    ApiError, CreateTaskRequest, ListTasksQuery, TaskResponse, TaskStatsResponse,
    UpdateTaskRequest,
};

/// Base URL used when `TASK_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

// =============================================================================
// Client Error
// =============================================================================

/// Errors returned by [`TaskApi`] calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status of an `Api` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Future returned by every [`TaskApi`] call.
pub type ClientFuture<T> = BoxFuture<'static, Result<T, ClientError>>;

fn client_future<T, F>(future: F) -> ClientFuture<T>
where
    F: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    Box::pin(future)
}

// =============================================================================
// Task API
// =============================================================================

/// Remote operations on the task resource.
pub trait TaskApi: Send + Sync {
    /// `GET /tasks` with the set filters.
    fn get_tasks(&self, filters: &ListTasksQuery) -> ClientFuture<Vec<TaskResponse>>;

    /// `GET /tasks/{id}`.
    fn get_task(&self, id: i64) -> ClientFuture<TaskResponse>;

    /// `POST /tasks`, returning the stored task.
    fn create_task(&self, request: &CreateTaskRequest) -> ClientFuture<TaskResponse>;

    /// `PUT /tasks/{id}` with `request.id`. The server returns no body.
    fn update_task(&self, request: &UpdateTaskRequest) -> ClientFuture<()>;

    /// `DELETE /tasks/{id}`.
    fn delete_task(&self, id: i64) -> ClientFuture<()>;

    /// `GET /tasks/categories`.
    fn get_categories(&self) -> ClientFuture<Vec<String>>;

    /// `GET /tasks/stats`.
    fn get_stats(&self) -> ClientFuture<TaskStatsResponse>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`TaskApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Creates a client for the API rooted at `base_url` (e.g. `http://host:5000/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client for `TASK_API_URL`, or [`DEFAULT_API_URL`] if unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("TASK_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base_url.trim())
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turns a non-success response into `ClientError::Api`.
///
/// The server's JSON `message` is used when the body carries one.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(error) = serde_json::from_str::<ApiError>(body) {
        return error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        format!(
            "Request failed with status {}",
            status.canonical_reason().unwrap_or_else(|| status.as_str())
        )
    } else {
        body.to_string()
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|error| ClientError::Decode(error.to_string()))
}

impl TaskApi for HttpTaskApi {
    fn get_tasks(&self, filters: &ListTasksQuery) -> ClientFuture<Vec<TaskResponse>> {
        let request = self.client.get(self.url("/tasks")).query(filters);
        client_future(async move { read_json(request.send().await?).await })
    }

    fn get_task(&self, id: i64) -> ClientFuture<TaskResponse> {
        let request = self.client.get(self.url(&format!("/tasks/{id}")));
        client_future(async move { read_json(request.send().await?).await })
    }

    fn create_task(&self, request: &CreateTaskRequest) -> ClientFuture<TaskResponse> {
        let request = self.client.post(self.url("/tasks")).json(request);
        client_future(async move { read_json(request.send().await?).await })
    }

    fn update_task(&self, request: &UpdateTaskRequest) -> ClientFuture<()> {
        let request = self
            .client
            .put(self.url(&format!("/tasks/{}", request.id)))
            .json(request);
        client_future(async move {
            check_status(request.send().await?).await?;
            Ok(())
        })
    }

    fn delete_task(&self, id: i64) -> ClientFuture<()> {
        let request = self.client.delete(self.url(&format!("/tasks/{id}")));
        client_future(async move {
            check_status(request.send().await?).await?;
            Ok(())
        })
    }

    fn get_categories(&self) -> ClientFuture<Vec<String>> {
        let request = self.client.get(self.url("/tasks/categories"));
        client_future(async move { read_json(request.send().await?).await })
    }

    fn get_stats(&self) -> ClientFuture<TaskStatsResponse> {
        let request = self.client.get(self.url("/tasks/stats"));
        client_future(async move { read_json(request.send().await?).await })
    }
}
