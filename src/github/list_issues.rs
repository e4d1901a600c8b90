//! GitHub issues listing operation.

use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{RawIssue, RepositoryRef};
use crate::github::error::GitHubError;
use crate::github::util::ApiContext;
use crate::github::wire::WireIssue;
use crate::runtime::AsyncStream;

/// Stream all issues (any state). The issues endpoint also returns pull
/// requests; those are skipped and do not count towards progress.
pub(crate) fn list_issues(
    ctx: ApiContext,
    repo: RepositoryRef,
    progress: ProgressFn,
) -> AsyncStream<Result<RawIssue, GitHubError>> {
    AsyncStream::spawn(move |tx| async move {
        let full_name = repo.full_name();
        let route = format!("/repos/{full_name}/issues");
        let filter = [("state", "all".to_string())];
        let mut seen = 0u64;
        let mut page = 1u32;

        loop {
            let items: Vec<WireIssue> = match ctx.page(&route, page, &filter, &full_name).await {
                Ok(items) => items,
                Err(e) => {
                    tx.send(Err(e));
                    return;
                }
            };
            let more = ctx.is_full_page(items.len());

            for item in items.into_iter().filter(|i| !i.is_pull_request()) {
                seen += 1;
                if !tx.send(Ok(item.into_raw())) {
                    return;
                }
            }

            if !more {
                break;
            }
            progress(seen, seen, "Fetching issues");
            page += 1;
        }

        progress(seen, seen, "Issues fetched");
    })
}
