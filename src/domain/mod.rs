//! Domain module for task management.
//!
//! This module contains the task document and its value objects.

pub mod task;

pub use task::{Priority, Task, TaskId, TaskIdError, TaskPatch, Timestamp};
