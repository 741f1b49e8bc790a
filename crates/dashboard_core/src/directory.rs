//! Read-only cache of randomly generated team members.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{MemberRole, TeamMember},
    protocol::RandomUser,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{cancel::CancelToken, gateway::DirectoryGateway, SyncError, SyncEvent};

pub const DEFAULT_TEAM_SIZE: usize = 5;
/// The sidebar never lists more than this many members.
pub const SIDEBAR_LIMIT: usize = 5;
pub const ONLINE_PROBABILITY: f64 = 0.7;
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load team members. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    pub members: Vec<TeamMember>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct DirectoryCache {
    gateway: Arc<dyn DirectoryGateway>,
    rng: StdMutex<StdRng>,
    state: Mutex<DirectoryState>,
    cancel: CancelToken,
    events: broadcast::Sender<SyncEvent>,
}

impl DirectoryCache {
    pub fn new(gateway: Arc<dyn DirectoryGateway>) -> Self {
        Self::with_rng(gateway, StdRng::from_os_rng())
    }

    /// Reproducible role and presence assignment.
    pub fn with_seed(gateway: Arc<dyn DirectoryGateway>, seed: u64) -> Self {
        Self::with_rng(gateway, StdRng::seed_from_u64(seed))
    }

    fn with_rng(gateway: Arc<dyn DirectoryGateway>, rng: StdRng) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            gateway,
            rng: StdMutex::new(rng),
            state: Mutex::new(DirectoryState::default()),
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

    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub async fn snapshot(&self) -> DirectoryState {
        self.state.lock().await.clone()
    }

    pub async fn members(&self) -> Vec<TeamMember> {
        self.state.lock().await.members.clone()
    }

    pub async fn visible(&self, limit: usize) -> Vec<TeamMember> {
        let state = self.state.lock().await;
        state.members.iter().take(limit).cloned().collect()
    }

    /// Replaces the cached members with `count` fresh ones.
    pub async fn fetch_all(&self, count: usize) -> Result<usize, SyncError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let outcome = self.cancel.run(self.gateway.random_users(count)).await?;
        let users = match outcome {
            Ok(users) => users,
            Err(err) => {
                warn!("directory: load failed: {err}");
                {
                    let mut state = self.state.lock().await;
                    if self.cancel.is_cancelled() {
                        return Err(crate::Cancelled.into());
                    }
                    state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                    state.loading = false;
                }
                let _ = self.events.send(SyncEvent::DirectoryLoadFailed {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                });
                return Err(err.into());
            }
        };

        let members = self.decorate(users);
        let count = members.len();
        {
            let mut state = self.state.lock().await;
            if self.cancel.is_cancelled() {
                return Err(crate::Cancelled.into());
            }
            state.members = members;
            state.loading = false;
        }

        info!(count, "directory: loaded");
        let _ = self.events.send(SyncEvent::DirectoryLoaded { count });
        Ok(count)
    }

    fn decorate(&self, users: Vec<RandomUser>) -> Vec<TeamMember> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        users
            .into_iter()
            .map(|user| TeamMember {
                name: user.display_name(),
                location: user.location_label(),
                id: user.login.uuid,
                email: user.email,
                avatar: user.picture.medium,
                phone: user.phone,
                role: Some(MemberRole::ALL[rng.random_range(0..MemberRole::ALL.len())]),
                online: rng.random_bool(ONLINE_PROBABILITY),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
