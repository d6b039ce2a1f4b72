//! `PostgreSQL` repository implementation.
//!
//! This module provides the `PostgreSQL`-backed `TaskRepository` using `sqlx`.
//! Column constraints live in the schema, so a violating write is rejected by
//! the database and surfaces as `RepositoryError::Validation`.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
//!     title VARCHAR(200) NOT NULL CHECK (btrim(title) <> ''),
//!     description VARCHAR(1000),
//!     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
//!     completed_at TIMESTAMPTZ,
//!     priority SMALLINT NOT NULL DEFAULT 2 CHECK (priority BETWEEN 1 AND 4),
//!     category VARCHAR(50),
//!     due_date TIMESTAMPTZ
//! );
//! CREATE INDEX idx_tasks_is_completed ON tasks(is_completed);
//! CREATE INDEX idx_tasks_created_at ON tasks(created_at);
//! CREATE INDEX idx_tasks_category ON tasks(category);
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

use crate::domain::{NewTask, Priority, Task, TaskId};
use crate::infrastructure::{
    RepositoryError, RepositoryFuture, TaskFilter, TaskRepository, repository_future,
};

/// Statements run by [`PostgresTaskRepository::ensure_schema`], in order.
pub const SCHEMA_STATEMENTS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS tasks ( \
         id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, \
         title VARCHAR(200) NOT NULL CHECK (btrim(title) <> ''), \
         description VARCHAR(1000), \
         is_completed BOOLEAN NOT NULL DEFAULT FALSE, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP, \
         completed_at TIMESTAMPTZ, \
         priority SMALLINT NOT NULL DEFAULT 2 CHECK (priority BETWEEN 1 AND 4), \
         category VARCHAR(50), \
         due_date TIMESTAMPTZ \
     )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_is_completed ON tasks(is_completed)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category)",
];

const TASK_COLUMNS: &str =
    "id, title, description, is_completed, created_at, completed_at, priority, category, due_date";

// =============================================================================
// Row Mapping
// =============================================================================

/// One row of the `tasks` table as `sqlx` decodes it.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    is_completed: bool,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    priority: i16,
    category: Option<String>,
    due_date: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let priority = Priority::try_from(i64::from(row.priority))
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

        Ok(Self {
            id: TaskId::new(row.id),
            title: row.title,
            description: row.description,
            is_completed: row.is_completed,
            created_at: row.created_at,
            completed_at: row.completed_at,
            priority,
            category: row.category,
            due_date: row.due_date,
        })
    }
}

fn rows_to_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, RepositoryError> {
    rows.into_iter().map(Task::try_from).collect()
}

fn priority_to_database_value(priority: Priority) -> i16 {
    i16::from(priority.value())
}

/// Maps a driver error, separating constraint violations from other failures.
///
/// SQLSTATE class 22 (data exception, e.g. value too long) and class 23
/// (integrity constraint violation) are caused by the written values.
fn map_database_error(error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(database_error) = &error {
        let is_constraint_violation = database_error
            .code()
            .is_some_and(|code| code.starts_with("22") || code.starts_with("23"));
        if is_constraint_violation {
            return RepositoryError::Validation(database_error.message().to_string());
        }
    }
    RepositoryError::DatabaseError(error.to_string())
}

// =============================================================================
// Filter Composition
// =============================================================================

/// Builds the `WHERE` clause for a filter with positional placeholders.
///
/// Placeholders are numbered in the order [`bind_filter`] binds values:
/// completion flag, category, priority.
fn build_where_clause(filter: &TaskFilter) -> String {
    let mut conditions = Vec::new();
    let mut bind_index = 1;

    if filter.is_completed.is_some() {
        conditions.push(format!("is_completed = ${bind_index}"));
        bind_index += 1;
    }
    if filter.category().is_some() {
        conditions.push(format!("category = ${bind_index}"));
        bind_index += 1;
    }
    if filter.priority.is_some() {
        conditions.push(format!("priority = ${bind_index}"));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn bind_filter<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &'q TaskFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    if let Some(is_completed) = filter.is_completed {
        query = query.bind(is_completed);
    }
    if let Some(category) = filter.category() {
        query = query.bind(category);
    }
    if let Some(priority) = filter.priority {
        query = query.bind(priority_to_database_value(priority));
    }
    query
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
/// repository.ensure_schema().await?;
/// let tasks = repository.list(&TaskFilter::all()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `tasks` table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DatabaseError` if a statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_database_error)?;
        }
        tracing::debug!("Task schema ensured");
        Ok(())
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>> {
        let pool = self.pool.clone();

        repository_future(async move {
            let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
            let row: Option<TaskRow> = sqlx::query_as(&sql)
                .bind(id.value())
                .fetch_optional(&pool)
                .await
                .map_err(map_database_error)?;

            row.map(Task::try_from).transpose()
        })
    }

    fn list(&self, filter: &TaskFilter) -> RepositoryFuture<Vec<Task>> {
        let pool = self.pool.clone();
        let filter = filter.clone();

        repository_future(async move {
            let sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks{} ORDER BY created_at DESC, id DESC",
                build_where_clause(&filter)
            );
            let rows: Vec<TaskRow> = bind_filter(sqlx::query_as(&sql), &filter)
                .fetch_all(&pool)
                .await
                .map_err(map_database_error)?;

            rows_to_tasks(rows)
        })
    }

    fn insert(&self, task: NewTask) -> RepositoryFuture<Task> {
        let pool = self.pool.clone();

        repository_future(async move {
            let sql = format!(
                "INSERT INTO tasks \
                 (title, description, is_completed, created_at, completed_at, priority, category, due_date) \
                 VALUES ($1, $2, FALSE, $3, NULL, $4, $5, $6) \
                 RETURNING {TASK_COLUMNS}"
            );
            let row: TaskRow = sqlx::query_as(&sql)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.created_at)
                .bind(priority_to_database_value(task.priority))
                .bind(&task.category)
                .bind(task.due_date)
                .fetch_one(&pool)
                .await
                .map_err(map_database_error)?;

            Task::try_from(row)
        })
    }

    fn update(&self, task: &Task) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let task = task.clone();

        repository_future(async move {
            let result = sqlx::query(
                "UPDATE tasks SET \
                 title = $2, description = $3, is_completed = $4, completed_at = $5, \
                 priority = $6, category = $7, due_date = $8 \
                 WHERE id = $1",
            )
            .bind(task.id.value())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.is_completed)
            .bind(task.completed_at)
            .bind(priority_to_database_value(task.priority))
            .bind(&task.category)
            .bind(task.due_date)
            .execute(&pool)
            .await
            .map_err(map_database_error)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn delete(&self, id: TaskId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();

        repository_future(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id.value())
                .execute(&pool)
                .await
                .map_err(map_database_error)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn distinct_categories(&self) -> RepositoryFuture<Vec<String>> {
        let pool = self.pool.clone();

        repository_future(async move {
            // COLLATE "C" gives the same ordinal order as the in-memory backend.
            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT DISTINCT category COLLATE \"C\" AS category \
                 FROM tasks WHERE category <> '' ORDER BY category",
            )
            .fetch_all(&pool)
            .await
            .map_err(map_database_error)?;

            Ok(rows.into_iter().map(|(category,)| category).collect())
        })
    }

    fn count(&self, filter: &TaskFilter) -> RepositoryFuture<u64> {
        let pool = self.pool.clone();
        let filter = filter.clone();

        repository_future(async move {
            let sql = format!(
                "SELECT COUNT(*) FROM tasks{}",
                build_where_clause(&filter)
            );
            let (count,): (i64,) = bind_filter(sqlx::query_as(&sql), &filter)
                .fetch_one(&pool)
                .await
                .map_err(map_database_error)?;

            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
