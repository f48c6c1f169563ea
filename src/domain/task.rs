//! Task domain model.
//!
//! A task is stored as a single document. Identity (`id`) and creation time
//! (`createdAt`) are assigned by the server and never change afterwards; every
//! other field can be replaced through a [`TaskPatch`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Serialized as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered `TaskId` (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error returned when a path segment is not a valid task identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Malformed task identifier '{input}': {reason}")]
pub struct TaskIdError {
    /// The rejected input.
    pub input: String,
    /// Parser diagnostic.
    pub reason: String,
}

impl FromStr for TaskId {
    type Err = TaskIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| TaskIdError {
                input: value.to_string(),
                reason: error.to_string(),
            })
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
///
/// Serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The priority level of a task.
///
/// Serialized with its capitalized name (`"Low"`, `"Medium"`, `"High"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities in ascending order, as offered by the task form.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the numeric value of the priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(formatter, "Low"),
            Self::Medium => write!(formatter, "Medium"),
            Self::High => write!(formatter, "High"),
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

// =============================================================================
// Task
// =============================================================================

/// A task document.
///
/// This is both the stored document and the listing payload, so a record the
/// client synthesizes after a create has exactly the shape `GET /api/tasks`
/// returns.
///
/// # Example
///
/// ```
/// use task_manager_api::domain::{Priority, Task, TaskId, Timestamp};
///
/// let task = Task::new(TaskId::generate(), "Buy milk", Timestamp::now())
///     .with_priority(Priority::High)
///     .with_due_date("2025-01-31");
///
/// assert!(!task.is_completed);
/// assert_eq!(task.description, "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Due date as entered (`YYYY-MM-DD` or RFC 3339). `None` means no due date.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
    /// Server-assigned creation time; the listing sort key.
    pub created_at: Timestamp,
}

impl Task {
    /// Creates a task with default description, due date, priority, and
    /// completion flag.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
            is_completed: false,
            created_at,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: impl Into<String>) -> Self {
        Self {
            due_date: Some(due_date.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub fn with_completed(self, is_completed: bool) -> Self {
        Self {
            is_completed,
            ..self
        }
    }

    /// Returns a copy with the supplied patch fields merged in.
    ///
    /// `id` and `created_at` are never touched.
    #[must_use]
    pub fn apply(self, patch: &TaskPatch) -> Self {
        Self {
            title: patch.title.clone().unwrap_or(self.title),
            description: patch.description.clone().unwrap_or(self.description),
            due_date: patch.due_date.clone().unwrap_or(self.due_date),
            priority: patch.priority.unwrap_or(self.priority),
            is_completed: patch.is_completed.unwrap_or(self.is_completed),
            ..self
        }
    }
}

// =============================================================================
// TaskPatch
// =============================================================================

/// A partial update of the mutable task fields.
///
/// `None` leaves a field untouched. For `due_date`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// Returns `true` if no field is supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.is_completed.is_none()
    }

    /// Renders the supplied fields as a JSON object using the document's
    /// field names, suitable for a document-level merge.
    #[must_use]
    pub fn to_document(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut document = serde_json::Map::new();
        if let Some(title) = &self.title {
            document.insert("title".to_string(), title.clone().into());
        }
        if let Some(description) = &self.description {
            document.insert("description".to_string(), description.clone().into());
        }
        if let Some(due_date) = &self.due_date {
            document.insert(
                "dueDate".to_string(),
                due_date
                    .clone()
                    .map_or(serde_json::Value::Null, serde_json::Value::String),
            );
        }
        if let Some(priority) = self.priority {
            document.insert("priority".to_string(), priority.to_string().into());
        }
        if let Some(is_completed) = self.is_completed {
            document.insert("isCompleted".to_string(), is_completed.into());
        }
        document
    }
}

// =============================================================================
// Tests
// =============================================================================
