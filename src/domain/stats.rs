//! Aggregate completion statistics.

/// Completion summary over the whole task table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    /// Percentage of completed tasks, rounded to one decimal place.
    pub completion_rate: f64,
}

impl TaskStats {
    /// Builds the summary from the two counts the store reports.
    ///
    /// The rate is `0` for an empty table. Rounding is half-to-even at the
    /// first decimal.
    #[must_use]
    pub fn compute(total_tasks: u64, completed_tasks: u64) -> Self {
        Self {
            total_tasks,
            completed_tasks,
            pending_tasks: total_tasks.saturating_sub(completed_tasks),
            completion_rate: completion_rate(total_tasks, completed_tasks),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn completion_rate(total_tasks: u64, completed_tasks: u64) -> f64 {
    if total_tasks == 0 {
        return 0.0;
    }
    let percentage = completed_tasks as f64 / total_tasks as f64 * 100.0;
    (percentage * 10.0).round_ties_even() / 10.0
}
