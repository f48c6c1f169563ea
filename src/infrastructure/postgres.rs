//! `PostgreSQL` repository implementation.
//!
//! Tasks are stored as JSONB documents. Partial updates use the JSONB
//! concatenation operator, so a merge is a single `UPDATE` statement and
//! conflicting writes are serialized by the database.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     sequence BIGSERIAL NOT NULL
//! );
//! CREATE INDEX idx_tasks_created_at ON tasks (created_at DESC, sequence DESC);
//! ```

use futures::future::{BoxFuture, FutureExt};
use sqlx::PgPool;

use crate::domain::{Task, TaskId, TaskPatch};
use crate::infrastructure::{DeleteResult, RepositoryError, TaskRepository};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (\
     id UUID PRIMARY KEY, \
     data JSONB NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL, \
     sequence BIGSERIAL NOT NULL)";

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_tasks_created_at \
     ON tasks (created_at DESC, sequence DESC)";

fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn decode(data: serde_json::Value) -> Result<Task, RepositoryError> {
    serde_json::from_value(data)
        .map_err(|error| RepositoryError::SerializationError(error.to_string()))
}

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
/// repository.ensure_schema().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `tasks` table and its listing index if they are missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DatabaseError` if either statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        sqlx::query(CREATE_INDEX)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn insert(&self, task: &Task) -> BoxFuture<'static, Result<(), RepositoryError>> {
        let pool = self.pool.clone();
        let task = task.clone();

        async move {
            let data = serde_json::to_value(&task)
                .map_err(|error| RepositoryError::SerializationError(error.to_string()))?;

            let result = sqlx::query(
                "INSERT INTO tasks (id, data, created_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(task.id.as_uuid())
            .bind(&data)
            .bind(task.created_at.as_datetime())
            .execute(&pool)
            .await
            .map_err(database_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::DuplicateId(task.id));
            }
            Ok(())
        }
        .boxed()
    }

    fn find_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let pool = self.pool.clone();
        let task_id = *id;

        async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks WHERE id = $1")
                    .bind(task_id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;

            row.map(|(data,)| decode(data)).transpose()
        }
        .boxed()
    }

    fn find_all(&self) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let pool = self.pool.clone();

        async move {
            let rows: Vec<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks ORDER BY created_at DESC, sequence DESC")
                    .fetch_all(&pool)
                    .await
                    .map_err(database_error)?;

            rows.into_iter().map(|(data,)| decode(data)).collect()
        }
        .boxed()
    }

    fn update_by_id(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let pool = self.pool.clone();
        let task_id = *id;
        let document = serde_json::Value::Object(patch.to_document());

        async move {
            let row: Option<(serde_json::Value,)> = sqlx::query_as(
                "UPDATE tasks SET data = data || $2::jsonb WHERE id = $1 RETURNING data",
            )
            .bind(task_id.as_uuid())
            .bind(&document)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            row.map(|(data,)| decode(data)).transpose()
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>> {
        let pool = self.pool.clone();
        let task_id = *id;

        async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(task_id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            Ok(DeleteResult {
                deleted_count: result.rows_affected(),
            })
        }
        .boxed()
    }

    fn close(&self) -> BoxFuture<'static, ()> {
        let pool = self.pool.clone();
        async move {
            pool.close().await;
            tracing::info!("PostgreSQL pool closed");
        }
        .boxed()
    }
}
