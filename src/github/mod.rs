//! GitHub source provider
//!
//! Reads repository activity through the GitHub REST API using the octocrab
//! library, and hands it to the pipeline as normalized records.

pub mod client;
pub mod error;
pub mod provider;
pub mod rate_limit;
pub mod util;

// Re-export client types
pub use client::{GitHubClient, GitHubClientBuilder};

// Re-export error types
pub use error::{GitHubError, GitHubResult};
pub use provider::SourceProvider;
pub use rate_limit::{RateLimitPolicy, reset_from_headers, retry_rate_limited};
pub use util::{parse_repo_url, spawn_task};

// Provider JSON never leaves this module.
pub(crate) mod wire;

// GitHub API operations (internal)
pub(crate) mod get_repository;
pub(crate) mod list_comments;
pub(crate) mod list_commits;
pub(crate) mod list_issues;
pub(crate) mod list_pull_requests;
