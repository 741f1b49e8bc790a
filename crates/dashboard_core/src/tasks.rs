//! Task synchronizer: keeps the dashboard's task list consistent with the
//! remote `/todos` collection.
//!
//! Mutations are applied to local state only after the gateway call succeeds,
//! and the local merge is treated as authoritative afterwards (the placeholder
//! backend does not retain writes). A failed call leaves the collection as it
//! was and raises an error notification.

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use shared::{
    domain::{SortDirection, Task, TaskForm, TaskId},
    error::GatewayError,
    protocol::{CreateTaskRequest, RemoteTask, UpdateTaskRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    cancel::CancelToken, gateway::TaskGateway, ConfirmationPrompt, Notification, SyncError,
    SyncEvent,
};

/// Upper bound on how many remote tasks are kept after a fetch.
pub const TASK_FETCH_LIMIT: usize = 20;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks. Please try again.";
pub const SAVE_FAILED_MESSAGE: &str = "Error saving task. Please try again.";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting task. Please try again.";
pub const STATUS_FAILED_MESSAGE: &str = "Error updating task status. Please try again.";
pub const IN_FLIGHT_MESSAGE: &str = "Another change to this task is still in progress.";
pub const TITLE_REQUIRED_MESSAGE: &str = "Task title is required.";
pub const DELETE_CONFIRMATION_PROMPT: &str = "Are you sure you want to delete this task?";
pub const EMPTY_LIST_MESSAGE: &str = "No tasks found. Create your first task to get started!";

pub fn placeholder_description(title: &str) -> String {
    format!("Task details for \"{title}\". This is a placeholder description.")
}

/// Orders `tasks` by title. Stable, so equal titles keep their relative order.
pub fn sort_tasks(tasks: &mut [Task], direction: SortDirection) {
    match direction {
        SortDirection::Ascending => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
        SortDirection::Descending => tasks.sort_by(|a, b| b.title.cmp(&a.title)),
    }
}

fn task_from_remote(remote: RemoteTask) -> Task {
    let description = match remote.description {
        Some(description) if !description.is_empty() => description,
        _ => placeholder_description(&remote.title),
    };
    Task {
        id: remote.id,
        user_id: remote.user_id,
        title: remote.title,
        completed: remote.completed,
        description,
    }
}

/// The form currently open for creating (`target: None`) or editing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSlot {
    pub target: Option<TaskId>,
    pub form: TaskForm,
}

impl EditorSlot {
    pub fn is_edit(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskBoardState {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    pub sort_direction: SortDirection,
    pub editor: Option<EditorSlot>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Declined,
}

#[derive(Default)]
struct InflightRegistry {
    ids: StdMutex<HashSet<TaskId>>,
}

impl InflightRegistry {
    fn claim(&self, id: TaskId) -> Option<InflightClaim<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id) {
            return None;
        }
        Some(InflightClaim { registry: self, id })
    }
}

struct InflightClaim<'a> {
    registry: &'a InflightRegistry,
    id: TaskId,
}

impl Drop for InflightClaim<'_> {
    fn drop(&mut self) {
        self.registry
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct TaskSynchronizer {
    gateway: Arc<dyn TaskGateway>,
    confirm: Arc<dyn ConfirmationPrompt>,
    state: Mutex<TaskBoardState>,
    inflight: InflightRegistry,
    cancel: CancelToken,
    events: broadcast::Sender<SyncEvent>,
}

impl TaskSynchronizer {
    pub fn new(gateway: Arc<dyn TaskGateway>, confirm: Arc<dyn ConfirmationPrompt>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            gateway,
            confirm,
            state: Mutex::new(TaskBoardState::default()),
            inflight: InflightRegistry::default(),
            cancel: CancelToken::new(),
            events,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TaskBoardState {
        self.state.lock().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn task(&self, id: TaskId) -> Option<Task> {
        let state = self.state.lock().await;
        state.tasks.iter().find(|task| task.id == id).cloned()
    }

    /// Stops every in-flight call from committing; the view is going away.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn fetch_all(&self) -> Result<usize, SyncError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let remote = match self.guarded(self.gateway.list_tasks()).await {
            Ok(remote) => remote,
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                warn!("tasks: load failed: {err}");
                self.commit(|state| {
                    state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                    state.loading = false;
                })
                .await?;
                self.emit(SyncEvent::TasksLoadFailed {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                });
                return Err(err);
            }
        };

        let remote_count = remote.len();
        let tasks: Vec<Task> = remote
            .into_iter()
            .take(TASK_FETCH_LIMIT)
            .map(task_from_remote)
            .collect();
        let count = tasks.len();
        self.commit(|state| {
            state.tasks = tasks;
            state.loading = false;
        })
        .await?;

        info!(count, remote_count, "tasks: loaded");
        self.emit(SyncEvent::TasksLoaded { count });
        Ok(count)
    }

    pub async fn retry(&self) -> Result<usize, SyncError> {
        self.fetch_all().await
    }

    pub async fn create(&self, form: TaskForm) -> Result<Task, SyncError> {
        self.ensure_title(&form).await?;

        let request = CreateTaskRequest::new(form.title.clone());
        let created = match self.guarded(self.gateway.create_task(&request)).await {
            Ok(created) => created,
            Err(err) => return Err(self.fail(err, SAVE_FAILED_MESSAGE).await),
        };

        let task = Task {
            id: created.id,
            user_id: created.user_id,
            title: created.title,
            completed: created.completed,
            description: form.description,
        };
        let notification = Notification::success("Task created successfully");
        {
            let task = task.clone();
            let notification = notification.clone();
            self.commit(move |state| {
                state.tasks.insert(0, task);
                state.notification = Some(notification);
            })
            .await?;
        }

        info!(task_id = %task.id, "tasks: created");
        self.emit(SyncEvent::TaskCreated(task.clone()));
        self.emit(SyncEvent::Notified(notification));
        Ok(task)
    }

    pub async fn update(&self, id: TaskId, form: TaskForm) -> Result<Task, SyncError> {
        self.ensure_title(&form).await?;
        let _claim = self.claim(id).await?;
        self.ensure_present(id).await?;

        let request = UpdateTaskRequest::new(id, form.title.clone(), form.completed);
        // The echoed record is ignored; the local merge below is what the view keeps.
        if let Err(err) = self.guarded(self.gateway.update_task(id, &request)).await {
            return Err(self.fail(err, SAVE_FAILED_MESSAGE).await);
        }

        let notification = Notification::success("Task updated successfully");
        let merged = {
            let notification = notification.clone();
            self.commit(move |state| {
                let task = state.tasks.iter_mut().find(|task| task.id == id)?;
                task.title = form.title;
                task.description = form.description;
                task.completed = form.completed;
                let merged = task.clone();
                state.notification = Some(notification);
                Some(merged)
            })
            .await?
        };
        let Some(merged) = merged else {
            return Err(SyncError::NotFound(id));
        };

        info!(task_id = %id, "tasks: updated");
        self.emit(SyncEvent::TaskUpdated(merged.clone()));
        self.emit(SyncEvent::Notified(notification));
        Ok(merged)
    }

    pub async fn toggle_status(&self, task: &Task) -> Result<Task, SyncError> {
        let _claim = self.claim(task.id).await?;
        self.ensure_present(task.id).await?;

        let toggled = task.with_completed(!task.completed);
        let request = UpdateTaskRequest::new(toggled.id, toggled.title.clone(), toggled.completed);
        if let Err(err) = self
            .guarded(self.gateway.update_task(toggled.id, &request))
            .await
        {
            return Err(self.fail(err, STATUS_FAILED_MESSAGE).await);
        }

        let notification = Notification::success(format!(
            "Task marked as {}",
            if toggled.completed {
                "completed"
            } else {
                "pending"
            }
        ));
        {
            let toggled = toggled.clone();
            let notification = notification.clone();
            self.commit(move |state| {
                if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == toggled.id) {
                    *slot = toggled;
                }
                state.notification = Some(notification);
            })
            .await?;
        }

        info!(task_id = %toggled.id, completed = toggled.completed, "tasks: status toggled");
        self.emit(SyncEvent::TaskUpdated(toggled.clone()));
        self.emit(SyncEvent::Notified(notification));
        Ok(toggled)
    }

    pub async fn remove(&self, id: TaskId) -> Result<RemovalOutcome, SyncError> {
        let _claim = self.claim(id).await?;

        if !self.confirm.confirm(DELETE_CONFIRMATION_PROMPT).await {
            debug!(task_id = %id, "tasks: delete declined");
            return Ok(RemovalOutcome::Declined);
        }

        if let Err(err) = self.guarded(self.gateway.delete_task(id)).await {
            return Err(self.fail(err, DELETE_FAILED_MESSAGE).await);
        }

        let notification = Notification::success("Task deleted successfully");
        {
            let notification = notification.clone();
            self.commit(move |state| {
                state.tasks.retain(|task| task.id != id);
                state.notification = Some(notification);
            })
            .await?;
        }

        info!(task_id = %id, "tasks: deleted");
        self.emit(SyncEvent::TaskRemoved(id));
        self.emit(SyncEvent::Notified(notification));
        Ok(RemovalOutcome::Removed)
    }

    pub async fn sort(&self, direction: SortDirection) {
        {
            let mut state = self.state.lock().await;
            sort_tasks(&mut state.tasks, direction);
            state.sort_direction = direction;
        }
        self.emit(SyncEvent::TasksSorted(direction));
    }

    /// Flips the recorded direction and sorts with it.
    pub async fn toggle_sort(&self) -> SortDirection {
        let direction = {
            let mut state = self.state.lock().await;
            let direction = state.sort_direction.flipped();
            sort_tasks(&mut state.tasks, direction);
            state.sort_direction = direction;
            direction
        };
        self.emit(SyncEvent::TasksSorted(direction));
        direction
    }

    /// Opens the editor pre-filled from `task`, or blank for a new task.
    pub async fn open_editor(&self, task: Option<&Task>) {
        let slot = match task {
            Some(task) => EditorSlot {
                target: Some(task.id),
                form: TaskForm::from_task(task),
            },
            None => EditorSlot {
                target: None,
                form: TaskForm::default(),
            },
        };
        self.state.lock().await.editor = Some(slot);
    }

    pub async fn edit_form<F>(&self, edit: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut TaskForm),
    {
        let mut state = self.state.lock().await;
        let slot = state.editor.as_mut().ok_or(SyncError::EditorClosed)?;
        edit(&mut slot.form);
        Ok(())
    }

    pub async fn close_editor(&self) {
        self.state.lock().await.editor = None;
    }

    pub async fn editor(&self) -> Option<EditorSlot> {
        self.state.lock().await.editor.clone()
    }

    /// Saves the open editor. The slot closes on success and stays open on failure.
    pub async fn submit_editor(&self) -> Result<Task, SyncError> {
        let slot = self.editor().await.ok_or(SyncError::EditorClosed)?;
        let saved = match slot.target {
            Some(id) => self.update(id, slot.form.clone()).await?,
            None => self.create(slot.form.clone()).await?,
        };
        let mut state = self.state.lock().await;
        if state.editor.as_ref() == Some(&slot) {
            state.editor = None;
        }
        Ok(saved)
    }

    pub async fn notification(&self) -> Option<Notification> {
        self.state.lock().await.notification.clone()
    }

    pub async fn dismiss_notification(&self) {
        self.state.lock().await.notification = None;
    }

    /// Drops the notification once its display time has passed.
    pub async fn expire_notification(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        let mut state = self.state.lock().await;
        match &state.notification {
            Some(notification) if notification.is_expired(now) => {
                state.notification = None;
                true
            }
            _ => false,
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        Ok(self.cancel.run(call).await??)
    }

    /// Applies `apply` under the state lock unless the view has been torn down.
    async fn commit<R>(&self, apply: impl FnOnce(&mut TaskBoardState) -> R) -> Result<R, SyncError> {
        let mut state = self.state.lock().await;
        if self.cancel.is_cancelled() {
            debug!("tasks: discarding result after teardown");
            return Err(crate::Cancelled.into());
        }
        Ok(apply(&mut state))
    }

    async fn claim(&self, id: TaskId) -> Result<InflightClaim<'_>, SyncError> {
        match self.inflight.claim(id) {
            Some(claim) => Ok(claim),
            None => {
                warn!(task_id = %id, "tasks: rejected overlapping change");
                self.notify(Notification::error(IN_FLIGHT_MESSAGE)).await;
                Err(SyncError::MutationInFlight(id))
            }
        }
    }

    async fn ensure_title(&self, form: &TaskForm) -> Result<(), SyncError> {
        if form.has_title() {
            return Ok(());
        }
        self.notify(Notification::error(TITLE_REQUIRED_MESSAGE)).await;
        Err(SyncError::Validation(TITLE_REQUIRED_MESSAGE))
    }

    async fn ensure_present(&self, id: TaskId) -> Result<(), SyncError> {
        let state = self.state.lock().await;
        if state.tasks.iter().any(|task| task.id == id) {
            Ok(())
        } else {
            Err(SyncError::NotFound(id))
        }
    }

    /// Surfaces a failed mutation; cancellation stays silent.
    async fn fail(&self, err: SyncError, message: &str) -> SyncError {
        if err.is_cancelled() {
            return err;
        }
        warn!("tasks: {message} ({err})");
        self.notify(Notification::error(message)).await;
        err
    }

    async fn notify(&self, notification: Notification) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.lock().await.notification = Some(notification.clone());
        self.emit(SyncEvent::Notified(notification));
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/tasks_tests.rs"]
mod tests;
