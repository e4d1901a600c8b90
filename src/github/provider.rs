//! The seam between the analysis pipeline and a code-hosting provider.

use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{CommentRecord, RawCommit, RawIssue, RawPullRequest, RepositoryRef};
use crate::github::error::GitHubError;
use crate::runtime::{AsyncStream, AsyncTask};

/// Read-only access to a hosted repository's activity.
///
/// Streams are lazy and yield records in provider order; a fatal error is
/// delivered as the last item. The progress callback fires at page boundaries
/// and once more at the end with `current == total`.
pub trait SourceProvider: Send + Sync {
    fn repository(&self, owner: &str, name: &str)
    -> AsyncTask<Result<RepositoryRef, GitHubError>>;

    fn commits(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawCommit, GitHubError>>;

    fn pull_requests(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawPullRequest, GitHubError>>;

    /// Issues only; pull requests listed by the issues endpoint are skipped.
    fn issues(
        &self,
        repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawIssue, GitHubError>>;

    /// Conversation and review comments of one pull request.
    fn pull_request_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>>;

    fn issue_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>>;
}
