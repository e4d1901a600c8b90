//! GitHub API client wrapper
//!
//! Owns the shared `Octocrab` instance and the request policy, and implements
//! [`SourceProvider`] on top of the operation modules.
//!
//! # Examples
//!
//! ```rust,no_run
//! use repo_insights::github::{GitHubClient, SourceProvider};
//!
//! # async fn run() -> Result<(), repo_insights::github::GitHubError> {
//! let gh = GitHubClient::with_token("ghp_...")?;
//! let repo = gh.repository("rust-lang", "log").join().await?;
//! println!("{} at {:?}", repo.full_name(), repo.head_commit);
//! # Ok(())
//! # }
//! ```

use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{CommentRecord, RawCommit, RawIssue, RawPullRequest, RepositoryRef};
use crate::github::error::{GitHubError, GitHubResult};
use crate::github::provider::SourceProvider;
use crate::github::rate_limit::RateLimitPolicy;
use crate::github::util::ApiContext;
use crate::runtime::{AsyncStream, AsyncTask};
use octocrab::Octocrab;
use std::sync::Arc;
use std::time::Duration;

/// GitHub API client wrapper that encapsulates Octocrab.
///
/// Cloning is cheap (Arc clone).
#[derive(Clone, Debug)]
pub struct GitHubClient {
    ctx: ApiContext,
    commit_stats: bool,
}

impl GitHubClient {
    /// Create a new client builder
    #[must_use]
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    /// Convenience: create client with personal access token
    pub fn with_token(token: impl Into<String>) -> GitHubResult<Self> {
        Self::builder().personal_token(token).build()
    }

    /// Get inner Octocrab client
    #[must_use]
    pub fn inner(&self) -> &Arc<Octocrab> {
        &self.ctx.inner
    }

    #[must_use]
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        self.ctx.policy
    }
}

impl SourceProvider for GitHubClient {
    fn repository(
        &self,
        owner: &str,
        name: &str,
    ) -> AsyncTask<Result<RepositoryRef, GitHubError>> {
        crate::github::get_repository::get_repository(
            self.ctx.clone(),
            owner.to_string(),
            name.to_string(),
        )
    }

    fn commits(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawCommit, GitHubError>> {
        crate::github::list_commits::list_commits(
            self.ctx.clone(),
            repo.clone(),
            self.commit_stats,
            progress,
        )
    }

    fn pull_requests(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawPullRequest, GitHubError>> {
        crate::github::list_pull_requests::list_pull_requests(
            self.ctx.clone(),
            repo.clone(),
            progress,
        )
    }

    fn issues(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawIssue, GitHubError>> {
        crate::github::list_issues::list_issues(self.ctx.clone(), repo.clone(), progress)
    }

    fn pull_request_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
        crate::github::list_comments::pull_request_comments(self.ctx.clone(), repo.clone(), number)
    }

    fn issue_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
        crate::github::list_comments::issue_comments(self.ctx.clone(), repo.clone(), number)
    }
}

/// Builder for creating `GitHubClient`
pub struct GitHubClientBuilder {
    token: Option<String>,
    base_uri: Option<String>,
    policy: RateLimitPolicy,
    timeout: Duration,
    per_page: u8,
    commit_stats: bool,
}

impl GitHubClientBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: None,
            base_uri: None,
            policy: RateLimitPolicy::default(),
            timeout: Duration::from_secs(30),
            per_page: 100,
            commit_stats: true,
        }
    }

    /// Set personal access token for authentication
    pub fn personal_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set base URI (for GitHub Enterprise)
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Page size for list endpoints, clamped to GitHub's 1..=100.
    #[must_use]
    pub fn per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Fetch per-commit line stats (one extra request per commit).
    #[must_use]
    pub fn commit_stats(mut self, enabled: bool) -> Self {
        self.commit_stats = enabled;
        self
    }

    /// Build the `GitHubClient`
    pub fn build(self) -> GitHubResult<GitHubClient> {
        let mut builder = Octocrab::builder();

        if let Some(token) = self.token.filter(|t| !t.trim().is_empty()) {
            builder = builder.personal_token(token);
        }

        if let Some(uri) = self.base_uri {
            builder = builder
                .base_uri(&uri)
                .map_err(|e| GitHubError::ClientSetup(e.to_string()))?;
        }

        let octocrab = builder
            .build()
            .map_err(|e| GitHubError::ClientSetup(e.to_string()))?;

        Ok(GitHubClient {
            ctx: ApiContext {
                inner: Arc::new(octocrab),
                policy: self.policy,
                timeout: self.timeout,
                per_page: self.per_page,
            },
            commit_stats: self.commit_stats,
        })
    }
}

impl Default for GitHubClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
