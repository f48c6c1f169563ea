//! Mutating endpoints addressed by task identifier.
//!
//! Both operations are a single storage call. A missing task yields the
//! uniform 404 body and nothing is written.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::dto::{UpdateTaskRequest, WriteResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{Task, TaskId};
use crate::infrastructure::DeleteResult;

// =============================================================================
// PUT /api/tasks/{id}
// =============================================================================

/// Merges the supplied fields into a task.
///
/// The body may be a partial task or a full task record; identity and
/// creation time in the body are ignored.
///
/// # Response
///
/// - **200 OK**: `{"success": true, "result": <updated task>}`
/// - **400 Bad Request**: Malformed body or validation error
/// - **404 Not Found**: No task with that identifier (no upsert)
/// - **500 Internal Server Error**: Malformed identifier or storage failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] as listed above.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<WriteResponse<Task>>, ApiErrorResponse> {
    let task_id: TaskId = id.parse()?;
    let Json(request) = payload?;
    let patch = request.into_patch()?;

    // Nothing to merge: answer with the current document.
    let updated = if patch.is_empty() {
        state.task_repository.find_by_id(&task_id).await?
    } else {
        state.task_repository.update_by_id(&task_id, &patch).await?
    }
    .ok_or_else(ApiErrorResponse::not_found)?;

    tracing::info!(%task_id, fields = patch.to_document().len(), "Task updated");
    Ok(Json(WriteResponse::ok(updated)))
}

// =============================================================================
// DELETE /api/tasks/{id}
// =============================================================================

/// Permanently removes a task.
///
/// # Response
///
/// - **200 OK**: `{"success": true, "result": {"deletedCount": 1}}`
/// - **404 Not Found**: No task with that identifier
/// - **500 Internal Server Error**: Malformed identifier or storage failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] as listed above.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WriteResponse<DeleteResult>>, ApiErrorResponse> {
    let task_id: TaskId = id.parse()?;

    let result = state.task_repository.delete_by_id(&task_id).await?;
    if result.deleted_count == 0 {
        return Err(ApiErrorResponse::not_found());
    }

    tracing::info!(%task_id, "Task deleted");
    Ok(Json(WriteResponse::ok(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::domain::Timestamp;
    use crate::infrastructure::{FailingTaskRepository, InMemoryTaskRepository};

    #[fixture]
    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryTaskRepository::new()))
    }

    async fn seed(state: &AppState, title: &str) -> Task {
        let task = Task::new(TaskId::generate(), title, Timestamp::now());
        state.task_repository.insert(&task).await.unwrap();
        task
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_task_returns_updated_record(state: AppState) {
        let task = seed(&state, "Buy milk").await;
        let request = UpdateTaskRequest {
            is_completed: Some(true),
            ..UpdateTaskRequest::default()
        };

        let Json(response) = update_task(
            State(state.clone()),
            Path(task.id.to_string()),
            Ok(Json(request)),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert!(response.result.is_completed);
        assert_eq!(response.result.title, "Buy milk");
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_task_missing_is_not_found(state: AppState) {
        let error = update_task(
            State(state.clone()),
            Path(TaskId::generate().to_string()),
            Ok(Json(UpdateTaskRequest::default())),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert!(state.task_repository.find_all().await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_task_twice(state: AppState) {
        let task = seed(&state, "Buy milk").await;

        let Json(first) = delete_task(State(state.clone()), Path(task.id.to_string()))
            .await
            .unwrap();
        let second = delete_task(State(state.clone()), Path(task.id.to_string()))
            .await
            .unwrap_err();

        assert_eq!(first.result.deleted_count, 1);
        assert_eq!(second.status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_task_empty_body_returns_current(state: AppState) {
        let task = seed(&state, "Buy milk").await;

        let Json(response) = update_task(
            State(state.clone()),
            Path(task.id.to_string()),
            Ok(Json(UpdateTaskRequest::default())),
        )
        .await
        .unwrap();

        assert_eq!(response.result, task);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_task_clears_due_date_with_null(state: AppState) {
        let task = Task::new(TaskId::generate(), "Buy milk", Timestamp::now())
            .with_due_date("2025-01-31");
        state.task_repository.insert(&task).await.unwrap();
        let request: UpdateTaskRequest =
            serde_json::from_value(serde_json::json!({ "dueDate": null })).unwrap();

        let Json(response) =
            update_task(State(state), Path(task.id.to_string()), Ok(Json(request)))
                .await
                .unwrap();

        assert_eq!(response.result.due_date, None);
    }

    #[rstest]
    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let state = AppState::new(Arc::new(FailingTaskRepository));
        let id = TaskId::generate().to_string();
        let request = UpdateTaskRequest {
            title: Some("Buy milk".to_string()),
            ..UpdateTaskRequest::default()
        };

        let update = update_task(State(state.clone()), Path(id.clone()), Ok(Json(request)))
            .await
            .unwrap_err();
        let delete = delete_task(State(state), Path(id)).await.unwrap_err();

        for error in [update, delete] {
            assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!error.error.success);
        }
    }
}
