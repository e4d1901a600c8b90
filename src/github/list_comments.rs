//! Comment threads on pull requests and issues.

use crate::analysis::types::{CommentKind, CommentParent, CommentRecord, RepositoryRef};
use crate::github::error::GitHubError;
use crate::github::util::{ApiContext, spawn_task};
use crate::github::wire::WireComment;
use crate::runtime::AsyncTask;

/// Conversation comments followed by inline review comments of one PR.
pub(crate) fn pull_request_comments(
    ctx: ApiContext,
    repo: RepositoryRef,
    number: u64,
) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
    spawn_task(async move {
        let full_name = repo.full_name();
        let parent = CommentParent::PullRequest(number);

        let conversation: Vec<WireComment> = ctx
            .all_pages(
                &format!("/repos/{full_name}/issues/{number}/comments"),
                &[],
                &full_name,
            )
            .await?;
        let review: Vec<WireComment> = ctx
            .all_pages(
                &format!("/repos/{full_name}/pulls/{number}/comments"),
                &[],
                &full_name,
            )
            .await?;

        Ok(conversation
            .into_iter()
            .map(|c| c.into_record(parent, CommentKind::IssueComment))
            .chain(
                review
                    .into_iter()
                    .map(|c| c.into_record(parent, CommentKind::ReviewComment)),
            )
            .collect())
    })
}

/// Comments of one issue.
pub(crate) fn issue_comments(
    ctx: ApiContext,
    repo: RepositoryRef,
    number: u64,
) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
    spawn_task(async move {
        let full_name = repo.full_name();
        let comments: Vec<WireComment> = ctx
            .all_pages(
                &format!("/repos/{full_name}/issues/{number}/comments"),
                &[],
                &full_name,
            )
            .await?;
        Ok(comments
            .into_iter()
            .map(|c| c.into_record(CommentParent::Issue(number), CommentKind::IssueComment))
            .collect())
    })
}
