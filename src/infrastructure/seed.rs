//! Sample data for an empty task store.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{NewTask, Priority};
use crate::infrastructure::{RepositoryError, TaskFilter, TaskRepository};

/// The three starter tasks, created relative to `now`.
#[must_use]
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<NewTask> {
    let sample = |title: &str, description: &str, category: &str, priority, age_days| NewTask {
        title: title.to_string(),
        description: Some(description.to_string()),
        priority,
        category: Some(category.to_string()),
        due_date: None,
        created_at: now - Duration::days(age_days),
    };

    vec![
        sample(
            "Setup Development Environment",
            "Install and configure .NET, Vue.js, and PostgreSQL",
            "Development",
            Priority::High,
            2,
        ),
        sample(
            "Learn Vue.js Composition API",
            "Study Vue 3 Composition API and best practices",
            "Learning",
            Priority::Medium,
            1,
        ),
        sample(
            "Implement User Authentication",
            "Add JWT-based authentication to the API",
            "Development",
            Priority::High,
            0,
        ),
    ]
}

/// Inserts the sample tasks if the store holds no rows.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns `RepositoryError` if counting or inserting fails.
pub async fn seed_sample_tasks(
    repository: &dyn TaskRepository,
    now: DateTime<Utc>,
) -> Result<usize, RepositoryError> {
    if repository.count(&TaskFilter::all()).await? > 0 {
        tracing::debug!("Task store is not empty, skipping sample data");
        return Ok(0);
    }

    let tasks = sample_tasks(now);
    let inserted = tasks.len();
    for task in tasks {
        repository.insert(task).await?;
    }

    tracing::info!(inserted, "Seeded sample tasks");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryTaskRepository;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_seed_populates_empty_store() {
        let repository = InMemoryTaskRepository::new();
        let now = Utc::now();

        let inserted = seed_sample_tasks(&repository, now).await.unwrap();
        assert_eq!(inserted, 3);

        let tasks = repository.list(&TaskFilter::all()).await.unwrap();
        assert_eq!(tasks[0].title, "Implement User Authentication");
        assert_eq!(tasks[2].title, "Setup Development Environment");
        assert_eq!(tasks[2].created_at, now - Duration::days(2));
        assert!(tasks.iter().all(|task| !task.is_completed));

        let categories = repository.distinct_categories().await.unwrap();
        assert_eq!(categories, vec!["Development", "Learning"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_seed_skips_non_empty_store() {
        let repository = InMemoryTaskRepository::new();
        let now = Utc::now();
        seed_sample_tasks(&repository, now).await.unwrap();

        let inserted = seed_sample_tasks(&repository, now).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(repository.count(&TaskFilter::all()).await.unwrap(), 3);
    }
}
