//! Sign-in gate for the dashboard.
//!
//! The session is a value owned by [`SessionGuard`]; consumers receive the
//! guard through an `Arc` instead of reaching for global state. The credential
//! check sits behind [`CredentialVerifier`] so a real backend can replace the
//! fixed demo pair without touching callers.

use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    SignedOut,
    SignedIn {
        username: String,
    },
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::SignedIn { username } => Some(username),
            Self::SignedOut => None,
        }
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<bool>;
}

/// Accepts exactly one in-memory pair. Demo only: no hashing, tokens or expiry.
pub struct StaticCredentialVerifier {
    username: String,
    password: String,
}

impl StaticCredentialVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticCredentialVerifier {
    fn default() -> Self {
        Self::new("admin", "admin123")
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<bool> {
        Ok(credentials.username == self.username && credentials.password == self.password)
    }
}

pub struct SessionGuard {
    verifier: Arc<dyn CredentialVerifier>,
    session: RwLock<Session>,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(Arc::new(StaticCredentialVerifier::default()))
    }
}

impl SessionGuard {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            session: RwLock::new(Session::SignedOut),
        }
    }

    pub async fn attempt(&self, credentials: &Credentials) -> bool {
        match self.verifier.verify(credentials).await {
            Ok(true) => {
                *self.session.write().await = Session::SignedIn {
                    username: credentials.username.clone(),
                };
                info!(username = %credentials.username, "session: signed in");
                true
            }
            Ok(false) => {
                warn!(username = %credentials.username, "session: credentials rejected");
                false
            }
            Err(err) => {
                warn!(username = %credentials.username, "session: verifier failed: {err:#}");
                false
            }
        }
    }

    pub async fn clear(&self) {
        *self.session.write().await = Session::SignedOut;
        info!("session: signed out");
    }

    pub async fn current(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_signed_in()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
