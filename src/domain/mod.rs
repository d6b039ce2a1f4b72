//! Domain module for task tracking.
//!
//! This module contains the task entity, its value objects, and the
//! aggregate statistics computed over the task table.

pub mod stats;
pub mod task;

pub use stats::TaskStats;
pub use task::{
    CATEGORY_MAX_LENGTH, DESCRIPTION_MAX_LENGTH, NewTask, Priority, PriorityError,
    TITLE_MAX_LENGTH, Task, TaskId, TaskUpdate, check_column_constraints, completion_timestamp,
};
