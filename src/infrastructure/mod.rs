//! Infrastructure module for external services.
//!
//! This module contains the task repositories, the factory that selects one
//! at start-up, and the sample-data seed.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod seed;

pub use factory::{
    ConfigurationError, DEFAULT_MAX_CONNECTIONS, FactoryError, RepositoryConfig,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use repository::{
    RepositoryError, RepositoryFuture, TaskFilter, TaskRepository, repository_future,
};
pub use seed::{sample_tasks, seed_sample_tasks};
