use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure kind a gateway reports. Connection errors, non-success
/// statuses and undecodable bodies are not told apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{operation} failed: {reason}")]
    NetworkFailure {
        operation: &'static str,
        reason: String,
    },
}

impl GatewayError {
    pub fn network(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::NetworkFailure {
            operation,
            reason: reason.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::NetworkFailure { operation, .. } => operation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

/// Error body returned by the local placeholder API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
