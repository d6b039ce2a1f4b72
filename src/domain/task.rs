//! Task domain model.
//!
//! A task is the single persisted entity of the tracker. This module owns the
//! column limits, the integer encoding of [`Priority`], and the completion
//! timestamp rule applied on every update.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// =============================================================================
// Column Limits
// =============================================================================

/// Maximum number of characters in a task title.
pub const TITLE_MAX_LENGTH: usize = 200;

/// Maximum number of characters in a task description.
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

/// Maximum number of characters in a task category.
pub const CATEGORY_MAX_LENGTH: usize = 50;

// =============================================================================
// Value Objects
// =============================================================================

/// Unique identifier for a task, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// =============================================================================
// Priority
// =============================================================================

/// Error returned when a value does not name a priority.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriorityError {
    /// Integer outside the 1-4 range.
    #[error("Invalid priority value {0}, expected 1 (Low) to 4 (Critical)")]
    OutOfRange(i64),

    /// Text that is neither a number nor a priority name.
    #[error("Unknown priority '{0}'")]
    Unknown(String),
}

/// The priority level of a task.
///
/// On the wire a priority is its integer value (`Low = 1` .. `Critical = 4`).
/// Deserialization also accepts the case-insensitive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the integer value used on the wire and in the store.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = PriorityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            other => Err(PriorityError::OutOfRange(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

impl FromStr for Priority {
    type Err = PriorityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(number) = trimmed.parse::<i64>() {
            return Self::try_from(number);
        }
        match trimmed.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(PriorityError::Unknown(value.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(formatter, "Low"),
            Self::Medium => write!(formatter, "Medium"),
            Self::High => write!(formatter, "High"),
            Self::Critical => write!(formatter, "Critical"),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriorityVisitor)
    }
}

struct PriorityVisitor;

impl<'de> Visitor<'de> for PriorityVisitor {
    type Value = Priority;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a priority between 1 and 4 or a priority name")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Priority, E> {
        i64::try_from(value)
            .ok()
            .and_then(|number| Priority::try_from(number).ok())
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Priority, E> {
        Priority::try_from(value).map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Priority, E> {
        value
            .parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }
}

// =============================================================================
// Task
// =============================================================================

/// Fields of a task that does not exist yet.
///
/// The store assigns the id; new tasks always start incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Every client-writable field of an existing task.
///
/// `id` and `created_at` are absent because an update never changes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    /// Set only while `is_completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Materializes a new task under the id the store assigned to it.
    #[must_use]
    pub fn from_new(id: TaskId, new_task: NewTask) -> Self {
        Self {
            id,
            title: new_task.title,
            description: new_task.description,
            is_completed: false,
            created_at: new_task.created_at,
            completed_at: None,
            priority: new_task.priority,
            category: new_task.category,
            due_date: new_task.due_date,
        }
    }

    /// Overwrites every writable field and applies the completion rule.
    ///
    /// - incomplete -> complete: `completed_at` becomes `now`
    /// - complete -> complete: `completed_at` is kept
    /// - anything -> incomplete: `completed_at` is cleared
    #[must_use]
    pub fn apply_update(self, update: TaskUpdate, now: DateTime<Utc>) -> Self {
        let completed_at = completion_timestamp(
            self.is_completed,
            self.completed_at,
            update.is_completed,
            now,
        );

        Self {
            id: self.id,
            title: update.title,
            description: update.description,
            is_completed: update.is_completed,
            created_at: self.created_at,
            completed_at,
            priority: update.priority,
            category: update.category,
            due_date: update.due_date,
        }
    }

    /// Returns the category, treating an empty string as absent.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|category| !category.is_empty())
    }
}

/// Computes `completed_at` after a transition of the completion flag.
#[must_use]
pub fn completion_timestamp(
    was_completed: bool,
    previous: Option<DateTime<Utc>>,
    is_completed: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (was_completed, is_completed) {
        (false, true) => Some(now),
        (true, true) => previous,
        (_, false) => None,
    }
}

// =============================================================================
// Column Constraints
// =============================================================================

/// Checks the constraints a store enforces on write.
///
/// # Errors
///
/// Returns a description of the first violated constraint.
pub fn check_column_constraints(
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title is required".to_string());
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(format!("title exceeds {TITLE_MAX_LENGTH} characters"));
    }
    if description.is_some_and(|value| value.chars().count() > DESCRIPTION_MAX_LENGTH) {
        return Err(format!(
            "description exceeds {DESCRIPTION_MAX_LENGTH} characters"
        ));
    }
    if category.is_some_and(|value| value.chars().count() > CATEGORY_MAX_LENGTH) {
        return Err(format!("category exceeds {CATEGORY_MAX_LENGTH} characters"));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
