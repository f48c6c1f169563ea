//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod query;
pub mod transaction;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use dto::{CreateTaskRequest, CreateTaskResponse, UpdateTaskRequest, WriteResponse};
pub use error::{ApiError, ApiErrorResponse, FieldError, TASK_NOT_FOUND, ValidationError};
pub use handlers::{AppState, HealthResponse, create_task, health_check};
pub use query::{get_task, list_tasks};
pub use transaction::{delete_task, update_task};

/// Builds the application router.
///
/// A panic inside a handler is caught and answered with a 500 body; it only
/// affects the request that raised it.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
