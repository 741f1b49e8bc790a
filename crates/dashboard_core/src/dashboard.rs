//! The signed-in view: a task synchronizer and a directory cache that mount
//! and fetch independently and are torn down together.

use std::sync::Arc;

use tracing::info;

use crate::{
    cancel::CancelToken,
    directory::{DirectoryCache, DEFAULT_TEAM_SIZE},
    gateway::{DirectoryGateway, TaskGateway},
    session::SessionGuard,
    tasks::TaskSynchronizer,
    ConfirmationPrompt, SyncError,
};

/// Per-component fetch results from [`Dashboard::mount`].
#[derive(Debug)]
pub struct MountReport {
    pub tasks: Result<usize, SyncError>,
    pub team: Result<usize, SyncError>,
}

pub struct Dashboard {
    session: Arc<SessionGuard>,
    tasks: Arc<TaskSynchronizer>,
    directory: Arc<DirectoryCache>,
    cancel: CancelToken,
    team_size: usize,
}

impl Dashboard {
    pub fn new(
        session: Arc<SessionGuard>,
        task_gateway: Arc<dyn TaskGateway>,
        directory_gateway: Arc<dyn DirectoryGateway>,
        confirm: Arc<dyn ConfirmationPrompt>,
    ) -> Self {
        Self::from_parts(
            session,
            TaskSynchronizer::new(task_gateway, confirm),
            DirectoryCache::new(directory_gateway),
            CancelToken::new(),
        )
    }

    /// Assembles a view from pre-built components; both are rebound to `cancel`.
    pub fn from_parts(
        session: Arc<SessionGuard>,
        tasks: TaskSynchronizer,
        directory: DirectoryCache,
        cancel: CancelToken,
    ) -> Self {
        Self {
            session,
            tasks: Arc::new(tasks.with_cancel_token(cancel.clone())),
            directory: Arc::new(directory.with_cancel_token(cancel.clone())),
            cancel,
            team_size: DEFAULT_TEAM_SIZE,
        }
    }

    pub fn with_team_size(mut self, team_size: usize) -> Self {
        self.team_size = team_size;
        self
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.session
    }

    pub fn tasks(&self) -> &Arc<TaskSynchronizer> {
        &self.tasks
    }

    pub fn directory(&self) -> &Arc<DirectoryCache> {
        &self.directory
    }

    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// Fetches tasks and team members concurrently. Each component keeps its
    /// own error state; one failing does not affect the other.
    pub async fn mount(&self) -> Result<MountReport, SyncError> {
        if !self.session.is_signed_in().await {
            return Err(SyncError::NotSignedIn);
        }
        let (tasks, team) = futures::join!(
            self.tasks.fetch_all(),
            self.directory.fetch_all(self.team_size)
        );
        Ok(MountReport { tasks, team })
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub async fn sign_out(&self) {
        self.teardown();
        self.session.clear().await;
        info!("dashboard: closed");
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
