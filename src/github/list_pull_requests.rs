//! GitHub pull requests listing operation.

use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{RawPullRequest, RepositoryRef};
use crate::github::error::GitHubError;
use crate::github::util::ApiContext;
use crate::github::wire::{WirePullRequest, WireReview, approvers};
use crate::runtime::AsyncStream;
use log::warn;

/// Stream all pull requests (any state) in provider order.
///
/// Each PR is completed from the single-PR endpoint (line stats, comment
/// counts, `merged_by`) and its reviews (approvers).
pub(crate) fn list_pull_requests(
    ctx: ApiContext,
    repo: RepositoryRef,
    progress: ProgressFn,
) -> AsyncStream<Result<RawPullRequest, GitHubError>> {
    AsyncStream::spawn(move |tx| async move {
        let full_name = repo.full_name();
        let route = format!("/repos/{full_name}/pulls");
        let filter = [("state", "all".to_string())];
        let mut seen = 0u64;
        let mut page = 1u32;

        loop {
            let items: Vec<WirePullRequest> =
                match ctx.page(&route, page, &filter, &full_name).await {
                    Ok(items) => items,
                    Err(e) => {
                        tx.send(Err(e));
                        return;
                    }
                };
            let more = ctx.is_full_page(items.len());

            for item in items {
                let number = item.number;
                let detail = match ctx
                    .get_json::<WirePullRequest>(&format!("{route}/{number}"), &[], &full_name)
                    .await
                {
                    Ok(detail) => detail,
                    Err(e) if e.is_fatal() => {
                        tx.send(Err(e));
                        return;
                    }
                    Err(e) => {
                        warn!("Details unavailable for PR #{number}: {e}");
                        item
                    }
                };

                let reviews = match ctx
                    .all_pages::<WireReview>(&format!("{route}/{number}/reviews"), &[], &full_name)
                    .await
                {
                    Ok(reviews) => reviews,
                    Err(e) if e.is_fatal() => {
                        tx.send(Err(e));
                        return;
                    }
                    Err(e) => {
                        warn!("Reviews unavailable for PR #{number}: {e}");
                        Vec::new()
                    }
                };

                seen += 1;
                if !tx.send(Ok(detail.into_raw(approvers(&reviews)))) {
                    return;
                }
            }

            if !more {
                break;
            }
            progress(seen, seen + u64::from(ctx.per_page), "Fetching pull requests");
            page += 1;
        }

        progress(seen, seen, "Pull requests fetched");
    })
}
