//! GitHub repository commits listing operation.

use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{RawCommit, RepositoryRef};
use crate::github::error::GitHubError;
use crate::github::util::ApiContext;
use crate::github::wire::WireCommit;
use crate::runtime::AsyncStream;
use log::warn;

/// Stream every commit on the default branch, newest first, with line stats.
///
/// The list endpoint does not carry stats, so each commit is re-read from the
/// single-commit endpoint. A failed detail read keeps the commit with zeroed
/// stats unless the failure is fatal.
pub(crate) fn list_commits(
    ctx: ApiContext,
    repo: RepositoryRef,
    with_stats: bool,
    progress: ProgressFn,
) -> AsyncStream<Result<RawCommit, GitHubError>> {
    AsyncStream::spawn(move |tx| async move {
        let full_name = repo.full_name();
        let route = format!("/repos/{full_name}/commits");
        let branch = [("sha", repo.default_branch.clone())];
        let mut seen = 0u64;
        let mut page = 1u32;

        loop {
            let items: Vec<WireCommit> = match ctx.page(&route, page, &branch, &full_name).await {
                Ok(items) => items,
                // GitHub answers 409 for a repository without any commits.
                Err(GitHubError::Conflict(msg)) if page == 1 => {
                    warn!("No commits in {full_name}: {msg}");
                    Vec::new()
                }
                Err(e) => {
                    tx.send(Err(e));
                    return;
                }
            };
            let more = ctx.is_full_page(items.len());

            for item in items {
                let item = if with_stats {
                    match commit_detail(&ctx, &route, &item.sha, &full_name).await {
                        Ok(detail) => detail,
                        Err(e) if e.is_fatal() => {
                            tx.send(Err(e));
                            return;
                        }
                        Err(e) => {
                            warn!("Stats unavailable for commit {}: {e}", item.sha);
                            item
                        }
                    }
                } else {
                    item
                };
                seen += 1;
                if !tx.send(Ok(item.into_raw())) {
                    return;
                }
            }

            if !more {
                break;
            }
            progress(seen, seen + u64::from(ctx.per_page), "Fetching commits");
            page += 1;
        }

        progress(seen, seen, "Commits fetched");
    })
}

async fn commit_detail(
    ctx: &ApiContext,
    route: &str,
    sha: &str,
    context: &str,
) -> Result<WireCommit, GitHubError> {
    ctx.get_json(&format!("{route}/{sha}"), &[], context).await
}
