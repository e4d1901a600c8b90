use super::{EntityBatch, EntityContext, score_in_order};
use crate::analysis::progress::ProgressFn;
use crate::analysis::types::{CommitRecord, RawCommit, RepositoryRef};
use crate::github::GitHubError;
use crate::llm::ArtifactKind;
use log::info;

/// Score every commit message on the default branch.
pub async fn analyze_commits(
    repo: &RepositoryRef,
    ctx: &EntityContext<'_>,
    progress: ProgressFn,
) -> Result<EntityBatch<CommitRecord>, GitHubError> {
    let mut batch = EntityBatch::new(ctx.exclude_fallback_scores);
    let drafts = ctx.provider.commits(repo, progress);

    score_in_order(
        drafts,
        ctx,
        ArtifactKind::CommitMessage,
        |c: &RawCommit| (c.message.as_str(), ""),
        |raw, quality| {
            batch.note_score(&quality);
            let record = CommitRecord {
                sha: raw.sha,
                author: raw.author,
                message: raw.message,
                additions: raw.additions,
                deletions: raw.deletions,
                files_changed: raw.files_changed,
                committed_at: raw.committed_at,
                quality,
            };
            batch.ledger.record_commit(&record);
            batch.records.push(record);
        },
    )
    .await?;

    info!(
        "Analyzed {} commits of {} ({} fallback scores)",
        batch.records.len(),
        repo.full_name(),
        batch.fallbacks
    );
    Ok(batch)
}
