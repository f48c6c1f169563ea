//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection string (required when `STORAGE_MODE=postgres`)
//! - `DB_NAME`: database name; overrides the database named in `DATABASE_URL`
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let repository = RepositoryFactory::new(config).create().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use super::{InMemoryTaskRepository, PostgresTaskRepository, RepositoryError, TaskRepository};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for task documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage; data is lost on restart.
    #[default]
    InMemory,
    /// `PostgreSQL` JSONB documents.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// Connection string (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    /// Database name overriding the one in `database_url`.
    pub database_name: Option<String>,
}

impl RepositoryConfig {
    /// Creates a configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `STORAGE_MODE` is unrecognized or
    /// `DATABASE_URL` is missing for the `postgres` mode.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// Empty and whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`RepositoryConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode = read("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            storage_mode,
            database_url: read("DATABASE_URL"),
            database_name: read("DB_NAME"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` for `postgres` without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Schema initialization error: {0}")]
    Schema(#[from] RepositoryError),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Creates the storage handle selected by configuration.
///
/// The returned handle is meant to be created once at start-up, injected
/// into the application state, and closed at shutdown.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Connects to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the connection string is invalid, the
    /// database is unreachable, or the schema cannot be created.
    pub async fn create(&self) -> Result<Arc<dyn TaskRepository>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => {
                tracing::info!("Using in-memory task storage");
                Ok(Arc::new(InMemoryTaskRepository::new()))
            }
            StorageMode::Postgres => {
                let repository = PostgresTaskRepository::new(self.create_postgres_pool().await?);
                repository.ensure_schema().await?;
                tracing::info!("Using PostgreSQL task storage");
                Ok(Arc::new(repository))
            }
        }
    }

    async fn create_postgres_pool(&self) -> Result<sqlx::PgPool, FactoryError> {
        let url = self
            .config
            .database_url
            .as_deref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        let mut options = PgConnectOptions::from_str(url)
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;
        if let Some(name) = &self.config.database_name {
            options = options.database(name);
        }

        PgPoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
