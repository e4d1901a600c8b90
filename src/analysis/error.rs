use crate::github::GitHubError;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why an analysis run stopped. Nothing has been written when any of these
/// is returned before the flush phase.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    RateLimit {
        message: String,
        retry_after: Option<DateTime<Utc>>,
    },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("could not save results: {0}")]
    Store(#[from] StoreError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<GitHubError> for PipelineError {
    fn from(e: GitHubError) -> Self {
        let display = e.to_string();
        match e {
            GitHubError::Auth(message) => PipelineError::Auth(message),
            GitHubError::NotFound(message) => PipelineError::NotFound(message),
            GitHubError::RateLimit { reset_at, .. } => PipelineError::RateLimit {
                message: display,
                retry_after: reset_at,
            },
            _ => PipelineError::Provider(display),
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Runtime(e.to_string())
    }
}
