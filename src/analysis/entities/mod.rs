//! Entity analyzers: turn provider drafts into scored records and contributor
//! deltas.

pub mod comments;
pub mod commits;
pub mod issues;
pub mod pull_requests;

pub use comments::{CommentBatch, collect_comments};
pub use commits::analyze_commits;
pub use issues::analyze_issues;
pub use pull_requests::{analyze_pull_requests, links_issue};

use crate::analysis::contributors::ContributorLedger;
use crate::analysis::types::QualityScore;
use crate::github::{GitHubError, SourceProvider};
use crate::llm::{ArtifactKind, QualityScorer};
use crate::runtime::AsyncStream;
use futures::StreamExt;
use tokio::sync::Semaphore;

/// Shared collaborators of one run's analyzers.
#[derive(Clone, Copy)]
pub struct EntityContext<'a> {
    pub provider: &'a dyn SourceProvider,
    pub scorer: &'a QualityScorer,
    /// Bounds in-flight scoring and comment requests across all analyzers.
    pub permits: &'a Semaphore,
    /// How many comment threads the comment wave may fetch at once.
    pub width: usize,
    pub exclude_fallback_scores: bool,
}

/// Records of one entity type in provider order, plus what they contributed.
#[derive(Debug, Clone)]
pub struct EntityBatch<R> {
    pub records: Vec<R>,
    pub ledger: ContributorLedger,
    /// Scores that fell back to the neutral value.
    pub fallbacks: usize,
}

impl<R> EntityBatch<R> {
    #[must_use]
    pub fn new(exclude_fallback_scores: bool) -> Self {
        Self {
            records: Vec::new(),
            ledger: ContributorLedger::new(exclude_fallback_scores),
            fallbacks: 0,
        }
    }

    fn note_score(&mut self, quality: &QualityScore) {
        if quality.is_fallback {
            self.fallbacks += 1;
        }
    }
}

/// Score every draft of `items` one at a time and hand `(draft, score)` to
/// `emit` in provider order. The first provider error ends the walk and is
/// returned.
pub(crate) async fn score_in_order<R, T, E>(
    mut items: AsyncStream<Result<R, GitHubError>>,
    ctx: &EntityContext<'_>,
    kind: ArtifactKind,
    texts: T,
    mut emit: E,
) -> Result<(), GitHubError>
where
    T: Fn(&R) -> (&str, &str),
    E: FnMut(R, QualityScore),
{
    while let Some(item) = items.next().await {
        let raw = item?;
        let quality = {
            // A closed semaphore only lifts the bound.
            let _permit = ctx.permits.acquire().await.ok();
            let (title, body) = texts(&raw);
            ctx.scorer.score_titled(title, body, kind).await
        };
        emit(raw, quality);
    }
    Ok(())
}
