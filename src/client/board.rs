//! Client-side task board state.
//!
//! [`TaskBoard`] mirrors the server listing and applies every successful
//! write to its local copy without re-fetching. A failed command logs the
//! error, leaves the board as it was, and hands the error back.

use std::sync::Arc;

use super::api::{ClientError, TaskApi, UpdateBody};
use crate::api::{CreateTaskRequest, UpdateTaskRequest};
use crate::domain::{Priority, Task, TaskId};

// =============================================================================
// Form
// =============================================================================

/// Editable fields of the create/edit form.
///
/// `due_date` is kept as typed; an empty string means "no due date".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
}

impl TaskForm {
    /// Copies the editable fields of `task` into a form.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.clone().unwrap_or_default(),
            priority: task.priority,
        }
    }

    #[must_use]
    pub fn to_create_request(&self) -> CreateTaskRequest {
        CreateTaskRequest {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            due_date: Some(self.due_date.clone()).filter(|value| !value.trim().is_empty()),
            priority: Some(self.priority),
            is_completed: None,
        }
    }

    /// Builds an update that overwrites every form field. An empty due date
    /// clears the stored one.
    #[must_use]
    pub fn to_update_request(&self) -> UpdateTaskRequest {
        UpdateTaskRequest {
            title: Some(self.title.clone()),
            description: Some(Some(self.description.clone())),
            due_date: Some(Some(self.due_date.clone())),
            priority: Some(self.priority),
            is_completed: None,
        }
    }

    fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// What a [`TaskBoard::submit`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The title was blank; nothing was sent.
    Skipped,
    Created(TaskId),
    Updated(TaskId),
}

// =============================================================================
// Task Board
// =============================================================================

/// Ordered task records plus form, edit, detail, delete-confirmation and
/// filter state.
pub struct TaskBoard {
    api: Arc<dyn TaskApi>,
    tasks: Vec<Task>,
    form: TaskForm,
    editing_id: Option<TaskId>,
    detail_id: Option<TaskId>,
    confirm_delete_id: Option<TaskId>,
    show_completed: bool,
}

impl std::fmt::Debug for TaskBoard {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TaskBoard")
            .field("tasks", &self.tasks.len())
            .field("form", &self.form)
            .field("editing_id", &self.editing_id)
            .field("detail_id", &self.detail_id)
            .field("confirm_delete_id", &self.confirm_delete_id)
            .field("show_completed", &self.show_completed)
            .finish_non_exhaustive()
    }
}

impl TaskBoard {
    /// Creates an empty board. Call [`TaskBoard::load`] to fill it.
    #[must_use]
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            form: TaskForm::default(),
            editing_id: None,
            detail_id: None,
            confirm_delete_id: None,
            show_completed: true,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// All local records, newest first.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Records that pass the completion filter.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(|task| self.show_completed || !task.is_completed)
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    #[must_use]
    pub const fn form(&self) -> &TaskForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    #[must_use]
    pub const fn editing_id(&self) -> Option<TaskId> {
        self.editing_id
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    /// The record shown in the detail panel, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&Task> {
        self.detail_id.as_ref().and_then(|id| self.task(id))
    }

    #[must_use]
    pub const fn confirm_delete_id(&self) -> Option<TaskId> {
        self.confirm_delete_id
    }

    #[must_use]
    pub const fn show_completed(&self) -> bool {
        self.show_completed
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Replaces the local records with the server listing.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from the list request.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let tasks = self.api.list().await.inspect_err(|error| {
            tracing::error!(%error, "Error fetching tasks");
        })?;

        tracing::debug!(count = tasks.len(), "Tasks loaded");
        self.tasks = tasks;
        Ok(())
    }

    /// Creates a task from the form, or updates the task being edited.
    ///
    /// A blank title is dropped without a request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the form is rejected locally, or
    /// the error of the create/update request.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ClientError> {
        if self.form.is_blank() {
            return Ok(SubmitOutcome::Skipped);
        }

        let outcome = match self.editing_id {
            Some(id) => self.submit_update(id).await,
            None => self.submit_create().await,
        }
        .inspect_err(|error| {
            tracing::error!(%error, "Error saving task");
        })?;

        self.editing_id = None;
        self.form = TaskForm::default();
        Ok(outcome)
    }

    async fn submit_create(&mut self) -> Result<SubmitOutcome, ClientError> {
        let request = self.form.to_create_request();
        let validated = request.clone().validate()?;

        let response = self.api.create(&request).await?;
        let task = validated.into_task(response.inserted_id, response.created_at);

        tracing::debug!(task_id = %task.id, "Task created");
        self.tasks.insert(0, task);
        Ok(SubmitOutcome::Created(response.inserted_id))
    }

    async fn submit_update(&mut self, id: TaskId) -> Result<SubmitOutcome, ClientError> {
        let request = self.form.to_update_request();
        let patch = request.clone().into_patch()?;

        self.api.update(&id, &UpdateBody::Fields(request)).await?;

        self.replace_with(&id, |task| task.apply(&patch));
        tracing::debug!(task_id = %id, "Task updated");
        Ok(SubmitOutcome::Updated(id))
    }

    /// Loads `id` into the form for editing and closes the detail panel.
    ///
    /// Returns `false` if no local record has that id.
    pub fn start_edit(&mut self, id: &TaskId) -> bool {
        let Some(form) = self.task(id).map(TaskForm::from_task) else {
            return false;
        };
        self.form = form;
        self.editing_id = Some(*id);
        self.detail_id = None;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
        self.form = TaskForm::default();
    }

    /// Opens the detail panel for `id`. Returns `false` for an unknown id.
    pub fn open_detail(&mut self, id: &TaskId) -> bool {
        let found = self.task(id).is_some();
        if found {
            self.detail_id = Some(*id);
        }
        found
    }

    pub const fn close_detail(&mut self) {
        self.detail_id = None;
    }

    /// Asks for confirmation before deleting `id`. If the detail panel shows
    /// that record it is closed.
    pub fn request_delete(&mut self, id: &TaskId) {
        if self.detail_id == Some(*id) {
            self.detail_id = None;
        }
        self.confirm_delete_id = Some(*id);
    }

    pub const fn cancel_delete(&mut self) {
        self.confirm_delete_id = None;
    }

    /// Deletes the record awaiting confirmation.
    ///
    /// Returns `Ok(false)` when nothing is awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns the error of the delete request.
    pub async fn confirm_delete(&mut self) -> Result<bool, ClientError> {
        match self.confirm_delete_id {
            Some(id) => self.delete(&id).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Deletes `id` on the server and removes it locally.
    ///
    /// # Errors
    ///
    /// Returns the error of the delete request.
    pub async fn delete(&mut self, id: &TaskId) -> Result<(), ClientError> {
        self.api.delete(id).await.inspect_err(|error| {
            tracing::error!(%error, task_id = %id, "Error deleting task");
        })?;

        self.tasks.retain(|task| task.id != *id);
        self.confirm_delete_id = None;
        if self.detail_id == Some(*id) {
            self.detail_id = None;
        }
        tracing::debug!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Flips `isCompleted` and sends the whole record as the update body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an id with no local record, or the
    /// error of the update request.
    pub async fn toggle_complete(&mut self, id: &TaskId) -> Result<(), ClientError> {
        let Some(task) = self.task(id) else {
            return Err(ClientError::NotFound(format!("No local task {id}")));
        };
        let toggled = Task {
            is_completed: !task.is_completed,
            ..task.clone()
        };

        self.api
            .update(id, &UpdateBody::Record(toggled.clone()))
            .await
            .inspect_err(|error| {
                tracing::error!(%error, task_id = %id, "Error toggling completion");
            })?;

        self.replace_with(id, |_| toggled);
        Ok(())
    }

    pub const fn toggle_show_completed(&mut self) {
        self.show_completed = !self.show_completed;
    }

    pub const fn set_show_completed(&mut self, show_completed: bool) {
        self.show_completed = show_completed;
    }

    fn replace_with(&mut self, id: &TaskId, update: impl FnOnce(Task) -> Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == *id) {
            let current = slot.clone();
            *slot = update(current);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use std::sync::Mutex;

    use futures::future::{BoxFuture, FutureExt};

    use crate::api::{CreateTaskResponse, WriteResponse};
    use crate::domain::Timestamp;
    use crate::infrastructure::DeleteResult;

    /// Records calls and answers from a fixed script.
    #[derive(Default)]
    struct ScriptedApi {
        listing: Vec<Task>,
        fail: bool,
        updates: Mutex<Vec<serde_json::Value>>,
        deletes: Mutex<Vec<TaskId>>,
    }

    impl ScriptedApi {
        fn failure<T>() -> Result<T, ClientError> {
            Err(ClientError::Api {
                status: 500,
                message: "An internal error occurred".to_string(),
            })
        }
    }

    impl TaskApi for ScriptedApi {
        fn list(&self) -> BoxFuture<'static, Result<Vec<Task>, ClientError>> {
            let result = if self.fail {
                Self::failure()
            } else {
                Ok(self.listing.clone())
            };
            async move { result }.boxed()
        }

        fn create(
            &self,
            _request: &CreateTaskRequest,
        ) -> BoxFuture<'static, Result<CreateTaskResponse, ClientError>> {
            let result = if self.fail {
                Self::failure()
            } else {
                Ok(CreateTaskResponse {
                    success: true,
                    inserted_id: TaskId::generate(),
                    created_at: Timestamp::now(),
                })
            };
            async move { result }.boxed()
        }

        fn get(&self, id: &TaskId) -> BoxFuture<'static, Result<Task, ClientError>> {
            let result = self
                .listing
                .iter()
                .find(|task| task.id == *id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound("Task not found".to_string()));
            async move { result }.boxed()
        }

        fn update(
            &self,
            id: &TaskId,
            body: &UpdateBody,
        ) -> BoxFuture<'static, Result<WriteResponse<Task>, ClientError>> {
            self.updates
                .lock()
                .unwrap()
                .push(serde_json::to_value(body).unwrap());
            let result = if self.fail {
                Self::failure()
            } else {
                Ok(WriteResponse::ok(Task::new(*id, "server copy", Timestamp::now())))
            };
            async move { result }.boxed()
        }

        fn delete(
            &self,
            id: &TaskId,
        ) -> BoxFuture<'static, Result<WriteResponse<DeleteResult>, ClientError>> {
            self.deletes.lock().unwrap().push(*id);
            let result = if self.fail {
                Self::failure()
            } else {
                Ok(WriteResponse::ok(DeleteResult { deleted_count: 1 }))
            };
            async move { result }.boxed()
        }
    }

    #[fixture]
    fn listing() -> Vec<Task> {
        vec![
            Task::new(TaskId::generate(), "Newer", Timestamp::now()).with_completed(true),
            Task::new(TaskId::generate(), "Older", Timestamp::now())
                .with_description("Two litres")
                .with_due_date("2025-01-31")
                .with_priority(Priority::High),
        ]
    }

    async fn loaded_board(api: ScriptedApi) -> (TaskBoard, Arc<ScriptedApi>) {
        let api = Arc::new(api);
        let mut board = TaskBoard::new(api.clone());
        board.load().await.unwrap();
        (board, api)
    }

    #[rstest]
    #[tokio::test]
    async fn test_load_replaces_tasks(listing: Vec<Task>) {
        let (board, _) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;

        assert_eq!(board.tasks(), listing.as_slice());
        assert!(board.show_completed());
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_blank_title_skipped() {
        let (mut board, _) = loaded_board(ScriptedApi::default()).await;
        board.form_mut().title = "   ".to_string();

        let outcome = board.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert!(board.tasks().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_create_prepends_and_resets_form(listing: Vec<Task>) {
        let (mut board, _) = loaded_board(ScriptedApi {
            listing,
            ..ScriptedApi::default()
        })
        .await;
        board.form_mut().title = "Buy milk".to_string();
        board.form_mut().priority = Priority::Low;

        let outcome = board.submit().await.unwrap();

        let SubmitOutcome::Created(id) = outcome else {
            panic!("expected a create, got {outcome:?}");
        };
        let first = &board.tasks()[0];
        assert_eq!(first.id, id);
        assert_eq!(first.title, "Buy milk");
        assert_eq!(first.priority, Priority::Low);
        assert_eq!(first.due_date, None);
        assert!(!first.is_completed);
        assert_eq!(board.tasks().len(), 3);
        assert_eq!(board.form(), &TaskForm::default());
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_create_rejects_bad_due_date_locally() {
        let (mut board, _) = loaded_board(ScriptedApi::default()).await;
        board.form_mut().title = "Buy milk".to_string();
        board.form_mut().due_date = "next tuesday".to_string();

        let error = board.submit().await.unwrap_err();

        assert!(matches!(error, ClientError::Validation(_)));
        assert!(board.tasks().is_empty());
        assert_eq!(board.form().title, "Buy milk");
    }

    #[rstest]
    #[tokio::test]
    async fn test_edit_then_submit_merges_fields(listing: Vec<Task>) {
        let (mut board, api) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        let target = listing[1].clone();
        board.open_detail(&target.id);

        assert!(board.start_edit(&target.id));
        assert!(board.detail().is_none());
        assert_eq!(board.form().due_date, "2025-01-31");

        board.form_mut().title = "Buy oat milk".to_string();
        board.form_mut().due_date = String::new();
        let outcome = board.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Updated(target.id));
        let updated = board.task(&target.id).unwrap();
        assert_eq!(updated.title, "Buy oat milk");
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.description, "Two litres");
        assert_eq!(updated.created_at, target.created_at);
        assert!(!board.is_editing());
        assert_eq!(api.updates.lock().unwrap()[0]["dueDate"], "");
    }

    #[rstest]
    #[tokio::test]
    async fn test_cancel_edit_resets_form(listing: Vec<Task>) {
        let (mut board, _) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        board.start_edit(&listing[0].id);

        board.cancel_edit();

        assert!(!board.is_editing());
        assert_eq!(board.form(), &TaskForm::default());
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_sends_full_record(listing: Vec<Task>) {
        let (mut board, api) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        let target = &listing[1];

        board.toggle_complete(&target.id).await.unwrap();

        let toggled = board.task(&target.id).unwrap();
        assert!(toggled.is_completed);
        assert_eq!(toggled.title, target.title);
        let sent = &api.updates.lock().unwrap()[0];
        assert_eq!(sent["id"], serde_json::json!(target.id.to_string()));
        assert_eq!(sent["isCompleted"], serde_json::json!(true));
        assert_eq!(sent["priority"], serde_json::json!("High"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_twice_restores_record(listing: Vec<Task>) {
        let (mut board, _) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        let target = &listing[0];

        board.toggle_complete(&target.id).await.unwrap();
        board.toggle_complete(&target.id).await.unwrap();

        assert_eq!(board.task(&target.id), Some(target));
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_from_detail_flow(listing: Vec<Task>) {
        let (mut board, api) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        let target = listing[0].id;
        board.open_detail(&target);

        board.request_delete(&target);
        assert!(board.detail().is_none());
        assert_eq!(board.confirm_delete_id(), Some(target));

        assert!(board.confirm_delete().await.unwrap());

        assert!(board.task(&target).is_none());
        assert_eq!(board.confirm_delete_id(), None);
        assert_eq!(api.deletes.lock().unwrap().as_slice(), &[target]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_closes_matching_detail(listing: Vec<Task>) {
        let (mut board, _) = loaded_board(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        })
        .await;
        board.open_detail(&listing[0].id);

        board.delete(&listing[0].id).await.unwrap();

        assert!(board.detail().is_none());
        assert_eq!(board.tasks().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_confirm_delete_without_request_is_noop() {
        let (mut board, api) = loaded_board(ScriptedApi::default()).await;

        assert!(!board.confirm_delete().await.unwrap());
        assert!(api.deletes.lock().unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_filter_hides_completed(listing: Vec<Task>) {
        let (mut board, _) = loaded_board(ScriptedApi {
            listing,
            ..ScriptedApi::default()
        })
        .await;

        board.toggle_show_completed();
        let visible: Vec<&str> = board.visible_tasks().map(|task| task.title.as_str()).collect();
        assert_eq!(visible, vec!["Older"]);

        board.set_show_completed(true);
        assert_eq!(board.visible_tasks().count(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_failures_leave_state_unchanged(listing: Vec<Task>) {
        let api = Arc::new(ScriptedApi {
            listing: listing.clone(),
            ..ScriptedApi::default()
        });
        let mut board = TaskBoard::new(api);
        board.load().await.unwrap();

        let failing: Arc<dyn TaskApi> = Arc::new(ScriptedApi {
            fail: true,
            ..ScriptedApi::default()
        });
        let before = board.tasks().to_vec();
        board.api = failing;

        board.form_mut().title = "Buy milk".to_string();
        assert!(board.submit().await.is_err());
        assert_eq!(board.form().title, "Buy milk");

        board.start_edit(&listing[1].id);
        board.form_mut().title = "Renamed".to_string();
        assert!(board.submit().await.is_err());
        assert!(board.is_editing());

        assert!(board.toggle_complete(&listing[0].id).await.is_err());

        board.request_delete(&listing[0].id);
        assert!(board.confirm_delete().await.is_err());
        assert_eq!(board.confirm_delete_id(), Some(listing[0].id));

        assert!(board.load().await.is_err());
        assert_eq!(board.tasks(), before.as_slice());
    }
}
