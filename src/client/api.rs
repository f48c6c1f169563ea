//! HTTP client for the task API.
//!
//! [`TaskApi`] is the seam between the task board and the network.
//! [`HttpTaskApi`] talks to a running server with `reqwest`.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{
    ApiError, CreateTaskRequest, CreateTaskResponse, FieldError, UpdateTaskRequest,
    ValidationError, WriteResponse,
};
use crate::domain::{Task, TaskId};
use crate::infrastructure::DeleteResult;

// =============================================================================
// Client Error
// =============================================================================

/// Errors surfaced by task board commands.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with another non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The form failed local validation before any request was sent.
    #[error("Invalid input: {}", describe(.0))]
    Validation(Vec<FieldError>),
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ValidationError> for ClientError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.errors)
    }
}

// =============================================================================
// Task API Trait
// =============================================================================

/// Body of an update request.
///
/// A toggle sends the whole record; an edit sends the form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UpdateBody {
    Fields(UpdateTaskRequest),
    Record(Task),
}

/// The five task API operations as seen from a client.
pub trait TaskApi: Send + Sync {
    fn list(&self) -> BoxFuture<'static, Result<Vec<Task>, ClientError>>;

    fn create(
        &self,
        request: &CreateTaskRequest,
    ) -> BoxFuture<'static, Result<CreateTaskResponse, ClientError>>;

    fn get(&self, id: &TaskId) -> BoxFuture<'static, Result<Task, ClientError>>;

    fn update(
        &self,
        id: &TaskId,
        body: &UpdateBody,
    ) -> BoxFuture<'static, Result<WriteResponse<Task>, ClientError>>;

    fn delete(&self, id: &TaskId)
    -> BoxFuture<'static, Result<WriteResponse<DeleteResult>, ClientError>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `reqwest`-based [`TaskApi`].
///
/// # Example
///
/// ```ignore
/// let api = HttpTaskApi::new("http://localhost:3000");
/// let tasks = api.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Creates a client for the server at `base_url` (no trailing `/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, id: &TaskId) -> String {
        format!("{}/api/tasks/{id}", self.base_url)
    }
}

impl TaskApi for HttpTaskApi {
    fn list(&self) -> BoxFuture<'static, Result<Vec<Task>, ClientError>> {
        let request = self.client.get(self.collection_url());
        async move { read_json(request.send().await).await }.boxed()
    }

    fn create(
        &self,
        body: &CreateTaskRequest,
    ) -> BoxFuture<'static, Result<CreateTaskResponse, ClientError>> {
        let request = self.client.post(self.collection_url()).json(body);
        async move { read_json(request.send().await).await }.boxed()
    }

    fn get(&self, id: &TaskId) -> BoxFuture<'static, Result<Task, ClientError>> {
        let request = self.client.get(self.task_url(id));
        async move { read_json(request.send().await).await }.boxed()
    }

    fn update(
        &self,
        id: &TaskId,
        body: &UpdateBody,
    ) -> BoxFuture<'static, Result<WriteResponse<Task>, ClientError>> {
        let request = self.client.put(self.task_url(id)).json(body);
        async move { read_json(request.send().await).await }.boxed()
    }

    fn delete(
        &self,
        id: &TaskId,
    ) -> BoxFuture<'static, Result<WriteResponse<DeleteResult>, ClientError>> {
        let request = self.client.delete(self.task_url(id));
        async move { read_json(request.send().await).await }.boxed()
    }
}

/// Maps a response to its decoded body or a [`ClientError`].
async fn read_json<T: DeserializeOwned>(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, ClientError> {
    let response = response.map_err(|error| ClientError::Transport(error.to_string()))?;
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|error| ClientError::Decode(error.to_string()));
    }

    let message = response
        .json::<ApiError>()
        .await
        .map_or_else(|_| status.to_string(), |error| error.message);

    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(message))
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
