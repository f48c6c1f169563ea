//! Storage capability for task documents.
//!
//! The repository is a document collection keyed by a server-generated
//! identifier. Every method performs exactly one storage call and returns a
//! boxed `'static` future, so the trait stays object safe and callers can hold
//! it as `Arc<dyn TaskRepository>`.

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::domain::{Task, TaskId, TaskPatch};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// A document with the same identifier already exists.
    #[error("Duplicate identifier: {0}")]
    DuplicateId(TaskId),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Number of documents removed (0 or 1).
    pub deleted_count: u64,
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for task documents.
///
/// # Example
///
/// ```ignore
/// let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::new());
/// repository.insert(&task).await?;
/// let found = repository.find_by_id(&task.id).await?;
/// ```
pub trait TaskRepository: Send + Sync {
    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DuplicateId` if the identifier is taken.
    fn insert(&self, task: &Task) -> BoxFuture<'static, Result<(), RepositoryError>>;

    /// Finds a document by its identifier.
    ///
    /// Returns `Ok(None)` if no document matches.
    fn find_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>>;

    /// Returns every document, newest `created_at` first.
    ///
    /// Documents created at the same instant are returned most recently
    /// inserted first.
    fn find_all(&self) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>>;

    /// Merges the supplied patch fields into the matching document.
    ///
    /// Returns the updated document, or `Ok(None)` if nothing matched. Never
    /// inserts.
    fn update_by_id(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>>;

    /// Permanently removes the matching document.
    fn delete_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>>;

    /// Releases the underlying storage connection.
    fn close(&self) -> BoxFuture<'static, ()> {
        futures::future::ready(()).boxed()
    }
}

// =============================================================================
// Test Doubles
// =============================================================================

/// A repository whose every call fails with `DatabaseError`.
#[cfg(test)]
pub(crate) struct FailingTaskRepository;

#[cfg(test)]
impl FailingTaskRepository {
    fn failure<T: Send + 'static>() -> BoxFuture<'static, Result<T, RepositoryError>> {
        futures::future::ready(Err(RepositoryError::DatabaseError(
            "connection refused".to_string(),
        )))
        .boxed()
    }
}

#[cfg(test)]
impl TaskRepository for FailingTaskRepository {
    fn insert(&self, _task: &Task) -> BoxFuture<'static, Result<(), RepositoryError>> {
        Self::failure()
    }

    fn find_by_id(&self, _id: &TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        Self::failure()
    }

    fn find_all(&self) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        Self::failure()
    }

    fn update_by_id(
        &self,
        _id: &TaskId,
        _patch: &TaskPatch,
    ) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        Self::failure()
    }

    fn delete_by_id(&self, _id: &TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>> {
        Self::failure()
    }
}

// =============================================================================
// Tests
// =============================================================================
