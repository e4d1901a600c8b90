use super::{EntityBatch, EntityContext, score_in_order};
use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{IssueRecord, RawIssue, RepositoryRef};
use crate::github::GitHubError;
use crate::llm::ArtifactKind;
use log::info;

/// Score every issue description.
pub async fn analyze_issues(
    repo: &RepositoryRef,
    ctx: &EntityContext<'_>,
    progress: ProgressFn,
) -> Result<EntityBatch<IssueRecord>, GitHubError> {
    let mut batch = EntityBatch::new(ctx.exclude_fallback_scores);
    let drafts = ctx.provider.issues(repo, progress);

    score_in_order(
        drafts,
        ctx,
        ArtifactKind::IssueDescription,
        |issue: &RawIssue| (issue.title.as_str(), issue.body.as_str()),
        |raw, quality| {
            batch.note_score(&quality);
            let record = IssueRecord {
                number: raw.number,
                author: raw.author,
                title: raw.title,
                body: raw.body,
                state: raw.state,
                created_at: raw.created_at,
                closed_at: raw.closed_at,
                comments: raw.comments,
                assignees: raw.assignees,
                labels: raw.labels,
                quality,
            };
            batch.ledger.record_issue(&record);
            batch.records.push(record);
        },
    )
    .await?;

    info!(
        "Analyzed {} issues of {} ({} fallback scores)",
        batch.records.len(),
        repo.full_name(),
        batch.fallbacks
    );
    Ok(batch)
}
