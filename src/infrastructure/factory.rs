//! Repository factory for runtime backend selection.
//!
//! Chooses between the in-memory and `PostgreSQL` task stores from
//! environment configuration.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let task_repository = RepositoryFactory::new(config).create().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::{InMemoryTaskRepository, PostgresTaskRepository, RepositoryError, TaskRepository};

/// Default number of pooled `PostgreSQL` connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for task rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value or
    /// `DATABASE_URL` is missing when `STORAGE_MODE=postgres`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable source.
    ///
    /// Empty and whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// See [`RepositoryConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode = match read("STORAGE_MODE") {
            Some(value) => value.parse()?,
            None => StorageMode::default(),
        };

        let max_connections = match read("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(0) | Err(_) => return Err(ConfigurationError::InvalidMaxConnections(value)),
                Ok(count) => count,
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            storage_mode,
            database_url: read("DATABASE_URL"),
            max_connections,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if `PostgreSQL` storage
    /// is selected without a URL.
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.storage_mode, StorageMode::Postgres) && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors in repository configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// Pool size that is not a positive integer.
    #[error("Invalid DATABASE_MAX_CONNECTIONS: '{0}'. Expected a positive integer")]
    InvalidMaxConnections(String),
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Schema creation error.
    #[error("Schema initialization error: {0}")]
    Schema(#[from] RepositoryError),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating the task repository selected by configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the task repository.
    ///
    /// For `PostgreSQL` this connects the pool and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the connection or schema creation fails.
    pub async fn create(&self) -> Result<Arc<dyn TaskRepository>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => {
                tracing::info!("Using in-memory task storage");
                Ok(Arc::new(InMemoryTaskRepository::new()))
            }
            StorageMode::Postgres => {
                let repository = self.create_postgres_repository().await?;
                Ok(Arc::new(repository))
            }
        }
    }

    async fn create_postgres_repository(&self) -> Result<PostgresTaskRepository, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_deref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

        tracing::info!(
            max_connections = self.config.max_connections,
            "Connected to PostgreSQL"
        );

        let repository = PostgresTaskRepository::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }
}

// =============================================================================
// Tests
// =============================================================================
