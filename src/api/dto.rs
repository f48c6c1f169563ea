//! Data Transfer Objects for API requests and responses.
//!
//! The same types are used by the task board client, so request and response
//! bodies are both `Serialize` and `Deserialize`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{Priority, Task, TaskId, TaskPatch, Timestamp};

const TITLE_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 5000;

// =============================================================================
// Requests
// =============================================================================

/// Request body for `POST /api/tasks`.
///
/// Client-supplied `id` and `createdAt` keys are not part of the contract and
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Request body for `PUT /api/tasks/{id}`.
///
/// Only supplied keys are merged. `id`, `_id`, `createdAt` and any unknown
/// keys are dropped during deserialization, so a full task record is a valid
/// update body and identity can never change.
///
/// `description` and `dueDate` distinguish a missing key (`None`) from an
/// explicit `null` (`Some(None)`), which clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// `null` or an empty string clears the due date.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Marks a key as present, keeping `null` as `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreateTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: Priority,
    pub is_completed: bool,
}

impl ValidatedCreateTask {
    /// Builds the stored document from validated data and server-assigned
    /// identity.
    #[must_use]
    pub fn into_task(self, id: TaskId, created_at: Timestamp) -> Task {
        let task = Task::new(id, self.title, created_at)
            .with_description(self.description)
            .with_priority(self.priority)
            .with_completed(self.is_completed);

        match self.due_date {
            Some(due_date) => task.with_due_date(due_date),
            None => task,
        }
    }
}

impl CreateTaskRequest {
    /// Validates the request and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns every field error found: blank or overlong title, overlong
    /// description, unrecognized due date.
    pub fn validate(self) -> Result<ValidatedCreateTask, ValidationError> {
        let title = validate_title(&self.title);
        let description = validate_description(self.description.unwrap_or_default());
        let due_date = validate_due_date(self.due_date.as_deref());

        match (title, description, due_date) {
            (Ok(title), Ok(description), Ok(due_date)) => Ok(ValidatedCreateTask {
                title,
                description,
                due_date,
                priority: self.priority.unwrap_or_default(),
                is_completed: self.is_completed.unwrap_or(false),
            }),
            (title, description, due_date) => Err(collect_errors([
                title.err(),
                description.err(),
                due_date.err(),
            ])),
        }
    }
}

impl UpdateTaskRequest {
    /// Validates the supplied fields and converts them into a [`TaskPatch`].
    ///
    /// # Errors
    ///
    /// Same rules as [`CreateTaskRequest::validate`], applied to present
    /// fields only.
    pub fn into_patch(self) -> Result<TaskPatch, ValidationError> {
        let title = self.title.as_deref().map(validate_title).transpose();
        let description = self
            .description
            .map(|value| validate_description(value.unwrap_or_default()))
            .transpose();
        let due_date = self
            .due_date
            .map(|value| validate_due_date(value.as_deref()))
            .transpose();

        match (title, description, due_date) {
            (Ok(title), Ok(description), Ok(due_date)) => Ok(TaskPatch {
                title,
                description,
                due_date,
                priority: self.priority,
                is_completed: self.is_completed,
            }),
            (title, description, due_date) => Err(collect_errors([
                title.err(),
                description.err(),
                due_date.err(),
            ])),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response body for a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub success: bool,
    pub inserted_id: TaskId,
    /// Server creation time, so a client can build the listing record locally.
    pub created_at: Timestamp,
}

/// Response body for a successful update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse<T> {
    pub success: bool,
    pub result: T,
}

impl<T> WriteResponse<T> {
    #[must_use]
    pub const fn ok(result: T) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn collect_errors<const N: usize>(errors: [Option<ValidationError>; N]) -> ValidationError {
    ValidationError::new(
        errors
            .into_iter()
            .flatten()
            .flat_map(|error| error.errors)
            .collect(),
    )
}

/// Validates a task title.
///
/// # Validation Rules
///
/// - Title must not be blank (it is stored trimmed)
/// - Title must not exceed 200 characters
///
/// # Errors
///
/// Returns a `ValidationError` on the `title` field.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::single("title", "Title is required"));
    }

    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::single(
            "title",
            "Title must not exceed 200 characters",
        ));
    }

    Ok(title.to_string())
}

/// Validates a task description. Whitespace is preserved.
///
/// # Errors
///
/// Returns a `ValidationError` if the description exceeds 5000 characters.
pub fn validate_description(description: String) -> Result<String, ValidationError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::single(
            "description",
            "Description must not exceed 5000 characters",
        ));
    }
    Ok(description)
}

/// Validates a due date.
///
/// Accepts `YYYY-MM-DD` or RFC 3339. A missing or blank value means "no due
/// date" and yields `Ok(None)`.
///
/// # Errors
///
/// Returns a `ValidationError` on the `dueDate` field for any other format.
pub fn validate_due_date(due_date: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(due_date) = due_date.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let recognized = NaiveDate::parse_from_str(due_date, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(due_date).is_ok();

    if recognized {
        Ok(Some(due_date.to_string()))
    } else {
        Err(ValidationError::new(vec![FieldError::new(
            "dueDate",
            "Due date must be YYYY-MM-DD or RFC 3339",
        )]))
    }
}

// =============================================================================
// Tests
// =============================================================================
