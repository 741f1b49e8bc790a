use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use shared::{
    domain::{SortDirection, Task, TaskId},
    error::GatewayError,
};
use thiserror::Error;

pub mod cancel;
pub mod dashboard;
pub mod directory;
pub mod gateway;
pub mod session;
pub mod tasks;

pub use cancel::{CancelToken, Cancelled};
pub use dashboard::{Dashboard, MountReport};
pub use directory::{DirectoryCache, DirectoryState, DEFAULT_TEAM_SIZE, SIDEBAR_LIMIT};
pub use gateway::{
    DirectoryGateway, HttpDirectoryGateway, HttpTaskGateway, TaskGateway,
    DEFAULT_DIRECTORY_API_URL, DEFAULT_TASK_API_URL,
};
pub use session::{
    CredentialVerifier, Credentials, Session, SessionGuard, StaticCredentialVerifier,
};
pub use tasks::{EditorSlot, RemovalOutcome, TaskBoardState, TaskSynchronizer, TASK_FETCH_LIMIT};

/// How long a notification stays up before the view may hide it.
pub const NOTIFICATION_AUTO_HIDE_MS: i64 = 4_000;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Validation(&'static str),
    #[error("task {0} already has a change in flight")]
    MutationInFlight(TaskId),
    #[error("task {0} is not in the local collection")]
    NotFound(TaskId),
    #[error("no task is open in the editor")]
    EditorClosed,
    #[error("sign in before opening the dashboard")]
    NotSignedIn,
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient, dismissible message raised by a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            raised_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.raised_at >= TimeDelta::milliseconds(NOTIFICATION_AUTO_HIDE_MS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    TasksLoaded { count: usize },
    TasksLoadFailed { message: String },
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskRemoved(TaskId),
    TasksSorted(SortDirection),
    DirectoryLoaded { count: usize },
    DirectoryLoadFailed { message: String },
    Notified(Notification),
}

/// Interactive yes/no check run before destructive operations.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with yes; for scripted or non-interactive use.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "tests/fakes.rs"]
pub(crate) mod fakes;
