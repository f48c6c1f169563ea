//! Read-only task endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{Task, TaskId};

/// Lists every task, newest first.
///
/// # Response
///
/// - **200 OK**: JSON array of tasks (possibly empty)
/// - **500 Internal Server Error**: Storage failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] if the storage call fails.
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiErrorResponse> {
    let tasks = state.task_repository.find_all().await?;
    tracing::debug!(count = tasks.len(), "Listed tasks");
    Ok(Json(tasks))
}

/// Fetches a single task.
///
/// # Response
///
/// - **200 OK**: The task document
/// - **404 Not Found**: `{"success": false, "message": "Task not found"}`
/// - **500 Internal Server Error**: Malformed identifier or storage failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] as listed above.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let task_id: TaskId = id.parse()?;

    state
        .task_repository
        .find_by_id(&task_id)
        .await?
        .map(Json)
        .ok_or_else(ApiErrorResponse::not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::domain::Timestamp;
    use crate::infrastructure::{FailingTaskRepository, InMemoryTaskRepository, TaskRepository};

    #[rstest]
    #[tokio::test]
    async fn test_get_task_not_found() {
        let state = AppState::new(Arc::new(InMemoryTaskRepository::new()));

        let error = get_task(State(state), Path(TaskId::generate().to_string()))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_task_malformed_id_is_server_error() {
        let state = AppState::new(Arc::new(InMemoryTaskRepository::new()));

        let error = get_task(State(state), Path("not-an-id".to_string()))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_returns_documents() {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let task = Task::new(TaskId::generate(), "Buy milk", Timestamp::now());
        repository.insert(&task).await.unwrap();

        let Json(tasks) = list_tasks(State(AppState::new(repository))).await.unwrap();

        assert_eq!(tasks, vec![task]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let state = AppState::new(Arc::new(FailingTaskRepository));

        let list = list_tasks(State(state.clone())).await.unwrap_err();
        let get = get_task(State(state), Path(TaskId::generate().to_string()))
            .await
            .unwrap_err();

        for error in [list, get] {
            assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!error.error.success);
            assert_eq!(error.error.message, "An internal error occurred");
        }
    }
}
