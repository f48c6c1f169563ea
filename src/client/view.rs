//! Read-only projection of a [`TaskBoard`].
//!
//! [`BoardView::from_board`] derives everything the board displays; nothing in
//! here mutates state. `Display` renders the view as plain text.

use std::fmt;

use super::board::{TaskBoard, TaskForm};
use crate::domain::{Priority, Task, TaskId};

pub const EMPTY_MESSAGE: &str = "No tasks to show. Create one above!";
pub const NO_DESCRIPTION: &str = "No description provided.";
pub const NO_DUE_DATE: &str = "No due date";

/// The form header and its buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub form: TaskForm,
    /// `Add Task` or `Update Task`.
    pub submit_label: &'static str,
    /// The cancel button only appears while editing.
    pub show_cancel: bool,
    /// Every priority in ascending order, with the form's choice marked.
    pub priority_options: Vec<PriorityOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityOption {
    pub priority: Priority,
    pub selected: bool,
}

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub due_text: String,
    pub priority_text: String,
    /// Completed rows are rendered struck through.
    pub completed: bool,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            due_text: due_text(task),
            priority_text: format!("{} priority", task.priority),
            completed: task.is_completed,
        }
    }
}

/// The detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_text: String,
    pub priority_text: String,
    pub status_text: &'static str,
}

/// The delete confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub id: TaskId,
    pub title: Option<String>,
}

/// Everything the task board shows at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub form: FormView,
    pub show_completed: bool,
    pub shown_count: usize,
    pub rows: Vec<TaskRow>,
    /// Set when no row passes the filter.
    pub empty_message: Option<&'static str>,
    pub detail: Option<DetailView>,
    pub delete_prompt: Option<DeletePrompt>,
}

impl BoardView {
    #[must_use]
    pub fn from_board(board: &TaskBoard) -> Self {
        let rows: Vec<TaskRow> = board.visible_tasks().map(TaskRow::from_task).collect();

        let detail = board.detail().map(|task| DetailView {
            id: task.id,
            title: task.title.clone(),
            description: if task.description.trim().is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                task.description.clone()
            },
            due_text: due_text(task),
            priority_text: format!("{} priority", task.priority),
            status_text: if task.is_completed {
                "Completed"
            } else {
                "Pending"
            },
        });

        let delete_prompt = board.confirm_delete_id().map(|id| DeletePrompt {
            id,
            title: board.task(&id).map(|task| task.title.clone()),
        });

        Self {
            form: FormView {
                form: board.form().clone(),
                submit_label: if board.is_editing() {
                    "Update Task"
                } else {
                    "Add Task"
                },
                show_cancel: board.is_editing(),
                priority_options: Priority::ALL
                    .into_iter()
                    .map(|priority| PriorityOption {
                        priority,
                        selected: priority == board.form().priority,
                    })
                    .collect(),
            },
            show_completed: board.show_completed(),
            shown_count: rows.len(),
            empty_message: rows.is_empty().then_some(EMPTY_MESSAGE),
            rows,
            detail,
            delete_prompt,
        }
    }
}

fn due_text(task: &Task) -> String {
    task.due_date
        .as_deref()
        .map_or_else(|| NO_DUE_DATE.to_string(), |date| format!("Due: {date}"))
}

// =============================================================================
// Plain-text Rendering
// =============================================================================

fn strike(text: &str) -> String {
    text.chars().flat_map(|character| [character, '\u{0336}']).collect()
}

impl fmt::Display for BoardView {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = &self.form.form;
        writeln!(formatter, "== Task Manager ==")?;
        writeln!(formatter, "Title: {}", form.title)?;
        let priorities: Vec<String> = self
            .form
            .priority_options
            .iter()
            .map(|option| {
                if option.selected {
                    format!("[{}]", option.priority)
                } else {
                    option.priority.to_string()
                }
            })
            .collect();
        writeln!(formatter, "Priority: {}", priorities.join(" / "))?;
        writeln!(formatter, "Due date: {}", form.due_date)?;
        writeln!(formatter, "Description: {}", form.description)?;
        write!(formatter, "[{}]", self.form.submit_label)?;
        if self.form.show_cancel {
            write!(formatter, " [Cancel]")?;
        }
        writeln!(formatter)?;
        writeln!(formatter)?;

        let toggle = if self.show_completed { "x" } else { " " };
        writeln!(
            formatter,
            "Tasks ({} shown)  [{toggle}] Show completed",
            self.shown_count
        )?;

        if let Some(message) = self.empty_message {
            writeln!(formatter, "{message}")?;
        }
        for row in &self.rows {
            let mark = if row.completed { "x" } else { " " };
            let title = if row.completed {
                strike(&row.title)
            } else {
                row.title.clone()
            };
            writeln!(
                formatter,
                "[{mark}] {title} | {} | {}",
                row.due_text, row.priority_text
            )?;
        }

        if let Some(detail) = &self.detail {
            writeln!(formatter)?;
            writeln!(formatter, "-- {} --", detail.title)?;
            writeln!(formatter, "{}", detail.description)?;
            writeln!(formatter, "{}", detail.due_text)?;
            writeln!(formatter, "{}", detail.priority_text)?;
            writeln!(formatter, "Status: {}", detail.status_text)?;
        }

        if let Some(prompt) = &self.delete_prompt {
            writeln!(formatter)?;
            match &prompt.title {
                Some(title) => writeln!(formatter, "Delete \"{title}\"? This cannot be undone.")?,
                None => writeln!(formatter, "Delete this task? This cannot be undone.")?,
            }
            writeln!(formatter, "[Cancel] [Delete]")?;
        }

        Ok(())
    }
}
