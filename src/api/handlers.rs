//! HTTP handlers for task creation and health checks.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::dto::{CreateTaskRequest, CreateTaskResponse};
use super::error::ApiErrorResponse;
use crate::domain::{TaskId, Timestamp};
use crate::infrastructure::TaskRepository;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// The storage handle is built once at start-up by the repository factory and
/// passed to every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Task document storage.
    pub task_repository: Arc<dyn TaskRepository>,
}

impl AppState {
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self { task_repository }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

// =============================================================================
// POST /api/tasks Handler
// =============================================================================

/// Creates a new task.
///
/// The server assigns `id` and `createdAt`; `isCompleted` is taken from the
/// request and defaults to `false`.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Buy milk",
///   "description": "Optional description",
///   "dueDate": "2025-01-31",
///   "priority": "Low|Medium|High"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: `{"success": true, "insertedId": "...", "createdAt": "..."}`
/// - **400 Bad Request**: Malformed body or validation error
/// - **500 Internal Server Error**: Storage failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for validation and storage failures.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiErrorResponse> {
    let Json(request) = payload?;
    let validated = request.validate()?;

    let task = validated.into_task(TaskId::generate(), Timestamp::now());
    state.task_repository.insert(&task).await?;

    tracing::info!(task_id = %task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            success: true,
            inserted_id: task.id,
            created_at: task.created_at,
        }),
    ))
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::infrastructure::{FailingTaskRepository, InMemoryTaskRepository};

    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryTaskRepository::new()))
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_task_stores_document() {
        let state = state();
        let request = CreateTaskRequest {
            title: "Buy milk".to_string(),
            ..CreateTaskRequest::default()
        };

        let (status, Json(response)) = create_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(response.success);
        let stored = state
            .task_repository
            .find_by_id(&response.inserted_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.created_at, response.created_at);
        assert!(!stored.is_completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_task_blank_title_rejected() {
        let state = state();
        let request = CreateTaskRequest {
            title: "  ".to_string(),
            ..CreateTaskRequest::default()
        };

        let error = create_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert!(state.task_repository.find_all().await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_task_storage_failure_is_internal_error() {
        let state = AppState::new(Arc::new(FailingTaskRepository));
        let request = CreateTaskRequest {
            title: "Buy milk".to_string(),
            ..CreateTaskRequest::default()
        };

        let error = create_task(State(state), Ok(Json(request))).await.unwrap_err();

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.error.success);
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
    }
}
