//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract. Every DTO is camelCase on the wire and
//! both serializable and deserializable, so the HTTP client reuses them.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;
use crate::domain::{
    CATEGORY_MAX_LENGTH, DESCRIPTION_MAX_LENGTH, NewTask, Priority, TITLE_MAX_LENGTH, Task,
    TaskStats, TaskUpdate,
};
use crate::infrastructure::TaskFilter;

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a new task.
///
/// Other task fields in the body (`id`, `isCompleted`, `createdAt`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Priority level (defaults to Medium).
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Validates the request and builds the task to insert.
    ///
    /// # Errors
    ///
    /// Returns every field that violates a constraint.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTask, ValidationError> {
        validate_fields(
            &self.title,
            self.description.as_deref(),
            self.category.as_deref(),
        )?;

        Ok(NewTask {
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            due_date: self.due_date,
            created_at: now,
        })
    }
}

/// Request DTO for replacing a task.
///
/// `id` must equal the id in the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTaskRequest {
    /// Builds a request that writes back every field of `task`.
    #[must_use]
    pub fn from_task(task: &TaskResponse) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            is_completed: task.is_completed,
            priority: task.priority,
            category: task.category.clone(),
            due_date: task.due_date,
        }
    }

    /// Validates the request and builds the field overwrite.
    ///
    /// # Errors
    ///
    /// Returns every field that violates a constraint.
    pub fn validate(self) -> Result<TaskUpdate, ValidationError> {
        validate_fields(
            &self.title,
            self.description.as_deref(),
            self.category.as_deref(),
        )?;

        Ok(TaskUpdate {
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            priority: self.priority,
            category: self.category,
            due_date: self.due_date,
        })
    }
}

/// Response DTO for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.value(),
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            created_at: task.created_at,
            completed_at: task.completed_at,
            priority: task.priority,
            category: task.category,
            due_date: task.due_date,
        }
    }
}

/// Response DTO for completion statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatsResponse {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub completion_rate: f64,
}

impl From<TaskStats> for TaskStatsResponse {
    fn from(stats: TaskStats) -> Self {
        Self {
            total_tasks: stats.total_tasks,
            completed_tasks: stats.completed_tasks,
            pending_tasks: stats.pending_tasks,
            completion_rate: stats.completion_rate,
        }
    }
}

/// Query parameters for `GET /tasks`.
///
/// A blank value (`?priority=`) means the filter is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_filter"
    )]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_filter"
    )]
    pub priority: Option<Priority>,
}

fn deserialize_optional_filter<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|value| !value.trim().is_empty())
        .map_or(Ok(None), |value| {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(serde::de::Error::custom)
        })
}

impl From<ListTasksQuery> for TaskFilter {
    fn from(query: ListTasksQuery) -> Self {
        Self {
            is_completed: query.is_completed,
            category: query.category.filter(|category| !category.is_empty()),
            priority: query.priority,
        }
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Parses a timestamp sent by a client.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC), or a
/// bare `YYYY-MM-DD` (midnight UTC). Blank input is `None`.
///
/// # Errors
///
/// Returns a message naming the input if no format matches.
pub fn parse_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });

    naive
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| format!("invalid timestamp '{value}'"))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?.map_or(Ok(None), |value| {
        parse_timestamp(&value).map_err(serde::de::Error::custom)
    })
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a task title.
///
/// # Validation Rules
///
/// - Title must not be blank
/// - Title must not exceed 200 characters
///
/// # Errors
///
/// Returns a `title` field error.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::single("title", "Title is required"));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ValidationError::single(
            "title",
            format!("Title must not exceed {TITLE_MAX_LENGTH} characters"),
        ));
    }
    Ok(())
}

/// Validates a task description (at most 1000 characters).
///
/// # Errors
///
/// Returns a `description` field error.
pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description {
        Some(text) if text.chars().count() > DESCRIPTION_MAX_LENGTH => {
            Err(ValidationError::single(
                "description",
                format!("Description must not exceed {DESCRIPTION_MAX_LENGTH} characters"),
            ))
        }
        _ => Ok(()),
    }
}

/// Validates a task category (at most 50 characters).
///
/// # Errors
///
/// Returns a `category` field error.
pub fn validate_category(category: Option<&str>) -> Result<(), ValidationError> {
    match category {
        Some(text) if text.chars().count() > CATEGORY_MAX_LENGTH => Err(ValidationError::single(
            "category",
            format!("Category must not exceed {CATEGORY_MAX_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

/// Runs every field validator and collects all failures.
fn validate_fields(
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
) -> Result<(), ValidationError> {
    let mut collected = ValidationError::default();
    for result in [
        validate_title(title),
        validate_description(description),
        validate_category(category),
    ] {
        if let Err(error) = result {
            collected.merge(error);
        }
    }

    if collected.is_empty() {
        Ok(())
    } else {
        Err(collected)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 10, 30, 0).unwrap()
    }

    // -------------------------------------------------------------------------
    // Wire Format
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_response_wire_format() {
        let task = Task {
            id: TaskId::new(5),
            title: "Ship".to_string(),
            description: None,
            is_completed: false,
            created_at: fixed_time(),
            completed_at: None,
            priority: Priority::Critical,
            category: None,
            due_date: None,
        };

        let json = serde_json::to_value(TaskResponse::from(task)).unwrap();

        assert_eq!(json["id"], 5);
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["priority"], 4);
        assert_eq!(json["createdAt"], "2025-05-20T10:30:00Z");
        assert!(json["completedAt"].is_null());
        assert!(json["category"].is_null());
        assert!(json["dueDate"].is_null());
    }

    #[rstest]
    fn test_create_request_ignores_server_fields() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"id": 99, "title": "Read", "isCompleted": true, "priority": 3}"#,
        )
        .unwrap();

        assert_eq!(request.title, "Read");
        assert_eq!(request.priority, Priority::High);
        assert_eq!(request.due_date, None);
    }

    #[rstest]
    fn test_create_request_defaults() {
        let request: CreateTaskRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, CreateTaskRequest::default());
        assert_eq!(request.priority, Priority::Medium);
    }

    #[rstest]
    fn test_update_request_reads_completion_flag() {
        let request: UpdateTaskRequest = serde_json::from_str(
            r#"{"id": 3, "title": "Done", "isCompleted": true, "dueDate": "2025-07-01"}"#,
        )
        .unwrap();

        assert_eq!(request.id, 3);
        assert!(request.is_completed);
        assert_eq!(
            request.due_date,
            Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap())
        );
    }

    #[rstest]
    fn test_list_query_into_filter() {
        let query = ListTasksQuery {
            is_completed: Some(false),
            category: Some(String::new()),
            priority: Some(Priority::Low),
        };

        let filter = TaskFilter::from(query);
        assert_eq!(filter.is_completed, Some(false));
        assert_eq!(filter.category, None);
        assert_eq!(filter.priority, Some(Priority::Low));
    }

    fn parse_query(uri: &str) -> Result<ListTasksQuery, String> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::<ListTasksQuery>::try_from_uri(&uri)
            .map(|query| query.0)
            .map_err(|rejection| rejection.body_text())
    }

    #[rstest]
    #[case("/tasks?isCompleted=&priority=", ListTasksQuery::default())]
    #[case("/tasks?priority=%20", ListTasksQuery::default())]
    #[case(
        "/tasks?isCompleted=true&priority=critical",
        ListTasksQuery {
            is_completed: Some(true),
            category: None,
            priority: Some(Priority::Critical),
        }
    )]
    #[case(
        "/tasks?priority=2&category=Work",
        ListTasksQuery {
            is_completed: None,
            category: Some("Work".to_string()),
            priority: Some(Priority::Medium),
        }
    )]
    fn test_list_query_blank_values_are_absent(
        #[case] uri: &str,
        #[case] expected: ListTasksQuery,
    ) {
        assert_eq!(parse_query(uri).unwrap(), expected);
    }

    #[rstest]
    #[case("/tasks?priority=9")]
    #[case("/tasks?isCompleted=maybe")]
    fn test_list_query_rejects_invalid_values(#[case] uri: &str) {
        assert!(parse_query(uri).is_err());
    }

    // -------------------------------------------------------------------------
    // Timestamps
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("2025-05-20T10:30:00Z", Some(fixed_time()))]
    #[case("2025-05-20T12:30:00+02:00", Some(fixed_time()))]
    #[case("2025-05-20T10:30:00", Some(fixed_time()))]
    #[case("2025-05-20T10:30:00.000", Some(fixed_time()))]
    #[case("2025-05-20", Some(Utc.with_ymd_and_hms(2025, 5, 20, 0, 0, 0).unwrap()))]
    #[case("", None)]
    #[case("   ", None)]
    fn test_parse_timestamp(#[case] input: &str, #[case] expected: Option<DateTime<Utc>>) {
        assert_eq!(parse_timestamp(input), Ok(expected));
    }

    #[rstest]
    #[case("tomorrow")]
    #[case("2025-13-01")]
    fn test_parse_timestamp_rejects_garbage(#[case] input: &str) {
        assert!(parse_timestamp(input).is_err());
    }

    #[rstest]
    fn test_due_date_null_is_none() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "x", "dueDate": null}"#).unwrap();
        assert_eq!(request.due_date, None);

        let result =
            serde_json::from_str::<CreateTaskRequest>(r#"{"title": "x", "dueDate": "soon"}"#);
        assert!(result.is_err());
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_create_validate_builds_new_task() {
        let request = CreateTaskRequest {
            title: "Plan sprint".to_string(),
            category: Some("Work".to_string()),
            ..CreateTaskRequest::default()
        };

        let new_task = request.validate(fixed_time()).unwrap();
        assert_eq!(new_task.title, "Plan sprint");
        assert_eq!(new_task.created_at, fixed_time());
        assert_eq!(new_task.priority, Priority::Medium);
    }

    #[rstest]
    fn test_validation_collects_every_field() {
        let request = CreateTaskRequest {
            title: String::new(),
            description: Some("d".repeat(DESCRIPTION_MAX_LENGTH + 1)),
            category: Some("c".repeat(CATEGORY_MAX_LENGTH + 1)),
            ..CreateTaskRequest::default()
        };

        let error = request.validate(fixed_time()).unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description", "category"]);
    }

    #[rstest]
    #[case(TITLE_MAX_LENGTH, true)]
    #[case(TITLE_MAX_LENGTH + 1, false)]
    fn test_validate_title_length(#[case] length: usize, #[case] valid: bool) {
        assert_eq!(validate_title(&"t".repeat(length)).is_ok(), valid);
    }

    proptest! {
        #[test]
        fn prop_title_valid_iff_non_blank_and_within_limit(title in "\\PC{0,210}") {
            let expected = !title.trim().is_empty() && title.chars().count() <= TITLE_MAX_LENGTH;
            prop_assert_eq!(validate_title(&title).is_ok(), expected);
        }

        #[test]
        fn prop_category_limit(length in 0usize..80) {
            let category = "k".repeat(length);
            prop_assert_eq!(
                validate_category(Some(&category)).is_ok(),
                length <= CATEGORY_MAX_LENGTH
            );
        }
    }
}
