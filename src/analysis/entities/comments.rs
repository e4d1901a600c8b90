//! The second wave: comment threads of every PR and issue.

use super::EntityContext;
use crate::analysis::contributors::ContributorLedger;
use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{CommentParent, CommentRecord, RepositoryRef};
use futures::StreamExt;
use futures::stream;
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct CommentBatch {
    /// Sorted by parent, then creation time, then id.
    pub records: Vec<CommentRecord>,
    pub ledger: ContributorLedger,
    /// Parents whose comments could not be fetched.
    pub unavailable: usize,
}

/// Fetch comments for the given PRs and issues through the bounded pool.
/// A failed fetch is counted, never fatal.
pub async fn collect_comments(
    repo: &RepositoryRef,
    ctx: &EntityContext<'_>,
    pull_requests: &[u64],
    issues: &[u64],
    progress: ProgressFn,
) -> CommentBatch {
    let parents: Vec<CommentParent> = pull_requests
        .iter()
        .map(|&n| CommentParent::PullRequest(n))
        .chain(issues.iter().map(|&n| CommentParent::Issue(n)))
        .collect();
    let total = parents.len() as u64;
    let provider = ctx.provider;
    let permits = ctx.permits;

    let mut batch = CommentBatch {
        records: Vec::new(),
        ledger: ContributorLedger::new(ctx.exclude_fallback_scores),
        unavailable: 0,
    };
    progress(0, total, "Fetching comments");

    let mut fetches = stream::iter(parents)
        .map(|parent| async move {
            let _permit = permits.acquire().await.ok();
            let fetched = match parent {
                CommentParent::PullRequest(n) => provider.pull_request_comments(repo, n).join().await,
                CommentParent::Issue(n) => provider.issue_comments(repo, n).join().await,
            };
            (parent, fetched)
        })
        .buffer_unordered(ctx.width.max(1));

    let mut done = 0u64;
    while let Some((parent, fetched)) = fetches.next().await {
        done += 1;
        match fetched {
            Ok(comments) => batch.records.extend(comments),
            Err(e) => {
                warn!("Comments unavailable for {parent:?}: {e}");
                batch.unavailable += 1;
            }
        }
        progress(done, total, "Fetching comments");
    }

    batch
        .records
        .sort_by(|a, b| (a.parent, a.created_at, a.id).cmp(&(b.parent, b.created_at, b.id)));
    for comment in &batch.records {
        batch.ledger.record_comment(comment);
    }

    if batch.unavailable > 0 {
        warn!("Comments unavailable for {} items", batch.unavailable);
    }
    info!(
        "Fetched {} comments across {total} threads of {}",
        batch.records.len(),
        repo.full_name()
    );
    batch
}
