//! Task board client.
//!
//! [`TaskBoard`] holds the client state and runs commands against a
//! [`TaskApi`]; [`BoardView`] projects that state for display.

pub mod api;
pub mod board;
pub mod view;

pub use api::{ClientError, HttpTaskApi, TaskApi, UpdateBody};
pub use board::{SubmitOutcome, TaskBoard, TaskForm};
pub use view::{BoardView, DeletePrompt, DetailView, FormView, PriorityOption, TaskRow};
