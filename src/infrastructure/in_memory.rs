//! In-memory repository implementation.
//!
//! Suitable for development and tests. Writes are serialized through a
//! `tokio::sync::RwLock`; each stored document carries an insertion sequence
//! number used to order documents that share a `created_at`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use crate::domain::{Task, TaskId, TaskPatch};
use crate::infrastructure::{DeleteResult, RepositoryError, TaskRepository};

#[derive(Debug, Default)]
struct Collection {
    documents: HashMap<TaskId, (u64, Task)>,
    next_sequence: u64,
}

/// In-memory implementation of `TaskRepository`.
///
/// Clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    collection: Arc<RwLock<Collection>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn insert(&self, task: &Task) -> BoxFuture<'static, Result<(), RepositoryError>> {
        let collection = Arc::clone(&self.collection);
        let task = task.clone();
        async move {
            let mut guard = collection.write().await;
            if guard.documents.contains_key(&task.id) {
                return Err(RepositoryError::DuplicateId(task.id));
            }
            let sequence = guard.next_sequence;
            guard.next_sequence += 1;
            guard.documents.insert(task.id, (sequence, task));
            Ok(())
        }
        .boxed()
    }

    fn find_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let collection = Arc::clone(&self.collection);
        let id = *id;
        async move {
            let guard = collection.read().await;
            Ok(guard.documents.get(&id).map(|(_, task)| task.clone()))
        }
        .boxed()
    }

    fn find_all(&self) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let collection = Arc::clone(&self.collection);
        async move {
            let guard = collection.read().await;
            let mut entries: Vec<(u64, Task)> = guard.documents.values().cloned().collect();
            drop(guard);

            entries.sort_by(|(left_sequence, left), (right_sequence, right)| {
                right
                    .created_at
                    .cmp(&left.created_at)
                    .then_with(|| right_sequence.cmp(left_sequence))
            });
            Ok(entries.into_iter().map(|(_, task)| task).collect())
        }
        .boxed()
    }

    fn update_by_id(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let collection = Arc::clone(&self.collection);
        let id = *id;
        let patch = patch.clone();
        async move {
            let mut guard = collection.write().await;
            let Some((sequence, existing)) = guard.documents.remove(&id) else {
                return Ok(None);
            };
            let updated = existing.apply(&patch);
            guard.documents.insert(id, (sequence, updated.clone()));
            Ok(Some(updated))
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>> {
        let collection = Arc::clone(&self.collection);
        let id = *id;
        async move {
            let mut guard = collection.write().await;
            let deleted_count = u64::from(guard.documents.remove(&id).is_some());
            Ok(DeleteResult { deleted_count })
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
