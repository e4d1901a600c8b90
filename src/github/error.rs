//! GitHub API error types

use crate::runtime::TaskAborted;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for GitHub API operations
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Octocrab library error that carried no HTTP status worth classifying
    #[error("Octocrab error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Generic GitHub API error
    #[error("GitHub API error: {0}")]
    Api(String),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Credentials missing, rejected (401) or lacking access (403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit still in effect after the retry budget was spent
    #[error("{}", rate_limit_message(.reset_at, *.retries))]
    RateLimit {
        reset_at: Option<DateTime<Utc>>,
        retries: u32,
    },

    /// 409 from GitHub, returned e.g. when listing commits of an empty repository
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A request did not complete within the configured API timeout
    #[error("GitHub request timed out: {0}")]
    Timeout(String),

    /// Client setup/configuration error
    #[error("Client setup failed: {0}")]
    ClientSetup(String),
}

fn rate_limit_message(reset_at: &Option<DateTime<Utc>>, retries: u32) -> String {
    match reset_at {
        Some(at) => format!(
            "GitHub rate limit exceeded after {retries} retries, resets at {}",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => format!("GitHub rate limit exceeded after {retries} retries"),
    }
}

/// Convenience result alias for GitHub operations
pub type GitHubResult<T> = Result<T, GitHubError>;

impl GitHubError {
    /// Classify an HTTP failure. `context` names the resource for messages
    /// that reach the user (usually `owner/name`).
    #[must_use]
    pub fn from_status(status: u16, message: &str, context: &str) -> Self {
        match status {
            401 => GitHubError::Auth(format!("bad credentials while accessing {context}")),
            403 if mentions_rate_limit(message) => GitHubError::RateLimit {
                reset_at: None,
                retries: 0,
            },
            403 => GitHubError::Auth(format!("access to {context} is forbidden: {message}")),
            429 => GitHubError::RateLimit {
                reset_at: None,
                retries: 0,
            },
            404 => GitHubError::NotFound(format!(
                "Repository or resource not found: {context}. Check the URL and that the token can read it."
            )),
            409 => GitHubError::Conflict(format!("{context}: {message}")),
            _ => GitHubError::Api(format!("{context}: HTTP {status}: {message}")),
        }
    }

    /// Map an octocrab failure through [`GitHubError::from_status`] when it
    /// carries a GitHub response.
    #[must_use]
    pub fn from_octocrab(err: octocrab::Error, context: &str) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                Self::from_status(source.status_code.as_u16(), &source.message, context)
            }
            _ => GitHubError::Octocrab(err),
        }
    }

    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GitHubError::RateLimit { .. })
    }

    /// Errors that must abort a run rather than degrade a single item.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GitHubError::Auth(_) | GitHubError::NotFound(_) | GitHubError::RateLimit { .. }
        )
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("rate limit") || lower.contains("ratelimit")
}

impl From<TaskAborted> for GitHubError {
    fn from(e: TaskAborted) -> Self {
        GitHubError::Api(e.to_string())
    }
}
