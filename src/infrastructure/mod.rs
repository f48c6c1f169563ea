//! Infrastructure module for external services.
//!
//! This module contains the storage capability and its backends.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use factory::{
    ConfigurationError, FactoryError, RepositoryConfig, RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use repository::{DeleteResult, RepositoryError, TaskRepository};

#[cfg(test)]
pub(crate) use repository::FailingTaskRepository;
