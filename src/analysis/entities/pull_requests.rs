use super::{EntityBatch, EntityContext, score_in_order};
use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{PullRequestRecord, RawPullRequest, RepositoryRef};
use crate::github::GitHubError;
use crate::llm::ArtifactKind;
use log::info;
use regex::Regex;
use std::sync::LazyLock;

// "Fixes #12", "closes #3" and bare "#7" all count as a link.
static ISSUE_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:fix(?:es|ed)?|close[sd]?|resolve[sd]?)\s+)?#\d+").ok()
});

/// Whether a PR title or body references an issue.
#[must_use]
pub fn links_issue(title: &str, body: &str) -> bool {
    let Some(pattern) = ISSUE_REFERENCE.as_ref() else {
        return false;
    };
    pattern.is_match(title) || pattern.is_match(body)
}

/// Score every pull request description (title and body together).
pub async fn analyze_pull_requests(
    repo: &RepositoryRef,
    ctx: &EntityContext<'_>,
    progress: ProgressFn,
) -> Result<EntityBatch<PullRequestRecord>, GitHubError> {
    let mut batch = EntityBatch::new(ctx.exclude_fallback_scores);
    let drafts = ctx.provider.pull_requests(repo, progress);

    score_in_order(
        drafts,
        ctx,
        ArtifactKind::PullRequestDescription,
        |pr: &RawPullRequest| (pr.title.as_str(), pr.body.as_str()),
        |raw, quality| {
            batch.note_score(&quality);
            let record = PullRequestRecord {
                linked_to_issue: links_issue(&raw.title, &raw.body),
                number: raw.number,
                author: raw.author,
                title: raw.title,
                body: raw.body,
                state: raw.state,
                created_at: raw.created_at,
                closed_at: raw.closed_at,
                merged_at: raw.merged_at,
                additions: raw.additions,
                deletions: raw.deletions,
                changed_files: raw.changed_files,
                comments: raw.comments,
                review_comments: raw.review_comments,
                merged_by: raw.merged_by,
                approvers: raw.approvers,
                quality,
            };
            batch.ledger.record_pull_request(&record);
            batch.records.push(record);
        },
    )
    .await?;

    info!(
        "Analyzed {} pull requests of {} ({} fallback scores)",
        batch.records.len(),
        repo.full_name(),
        batch.fallbacks
    );
    Ok(batch)
}
