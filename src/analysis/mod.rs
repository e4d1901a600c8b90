//! The analysis pipeline.
//!
//! One run resolves the repository, scores commits, pull requests and issues
//! concurrently, fetches comment threads in a second wave, reduces the
//! contributor deltas, analyzes the source tree and finally flushes
//! everything to the store. Nothing is written until every stage before the
//! flush has succeeded.

pub mod code_quality;
pub mod config;
pub mod contributors;
pub mod entities;
pub mod error;
pub mod progress;
pub mod summary;
pub mod types;

pub use config::{AnalysisConfig, ConfigError};
pub use contributors::{ContributorAggregate, ContributorLedger};
pub use error::PipelineError;
pub use progress::{ProgressFn, ProgressSink, SourceKind};
pub use summary::{AnalysisSummary, CodeQualityOutcome};

use crate::analysis::code_quality::{CodeQualitySnapshot, CodeQualitySource};
use crate::analysis::entities::{
    EntityContext, analyze_commits, analyze_issues, analyze_pull_requests, collect_comments,
};
use crate::analysis::types::RepositoryRef;
use crate::github::{SourceProvider, parse_repo_url};
use crate::llm::{InsightMetrics, QualityScorer};
use crate::store::{PersistenceGateway, RepoId, StoreError};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub struct Pipeline {
    provider: Arc<dyn SourceProvider>,
    scorer: QualityScorer,
    code_source: Option<Arc<dyn CodeQualitySource>>,
    store: Arc<dyn PersistenceGateway>,
    config: AnalysisConfig,
    sink: Arc<dyn ProgressSink>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn SourceProvider>,
        scorer: QualityScorer,
        store: Arc<dyn PersistenceGateway>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            scorer,
            code_source: None,
            store,
            config,
            sink: Arc::new(|_: u64, _: u64, _: &str| {}),
        }
    }

    #[must_use]
    pub fn with_code_source(mut self, source: Arc<dyn CodeQualitySource>) -> Self {
        self.code_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the repository a GitHub URL (or `owner/name`) points at.
    pub async fn analyze_url(&self, url: &str) -> Result<AnalysisSummary, PipelineError> {
        let (owner, name) = parse_repo_url(url)?;
        self.analyze(&owner, &name).await
    }

    pub async fn analyze(&self, owner: &str, name: &str) -> Result<AnalysisSummary, PipelineError> {
        let started = Instant::now();
        let (progress, board) = progress::spawn_board(Arc::clone(&self.sink));

        progress.send(SourceKind::Repository, 0, 1, "Resolving repository");
        let repo = self.provider.repository(owner, name).join().await?;
        progress.send(SourceKind::Repository, 1, 1, repo.full_name());
        info!("Analyzing {} ({})", repo.full_name(), repo.default_branch);

        let permits = Semaphore::new(self.config.concurrency_limit.max(1));
        let ctx = EntityContext {
            provider: self.provider.as_ref(),
            scorer: &self.scorer,
            permits: &permits,
            width: self.config.concurrency_limit,
            exclude_fallback_scores: self.config.exclude_fallback_scores,
        };

        let (commits, pull_requests, issues) = tokio::try_join!(
            analyze_commits(&repo, &ctx, progress.for_source(SourceKind::Commits)),
            analyze_pull_requests(&repo, &ctx, progress.for_source(SourceKind::PullRequests)),
            analyze_issues(&repo, &ctx, progress.for_source(SourceKind::Issues)),
        )?;

        let pr_numbers: Vec<u64> = pull_requests.records.iter().map(|pr| pr.number).collect();
        let issue_numbers: Vec<u64> = issues.records.iter().map(|i| i.number).collect();
        let comments = collect_comments(
            &repo,
            &ctx,
            &pr_numbers,
            &issue_numbers,
            progress.for_source(SourceKind::Comments),
        )
        .await;

        let scoring_fallbacks = commits.fallbacks + pull_requests.fallbacks + issues.fallbacks;
        let mut ledger = commits.ledger;
        ledger.merge(pull_requests.ledger);
        ledger.merge(issues.ledger);
        ledger.merge(comments.ledger);

        let (snapshot, code_quality) = self.code_quality(&repo, &progress).await;

        progress.send(SourceKind::Persist, 0, 1, "Saving results");
        let staged = Staged {
            repository: repo.clone(),
            commits: commits.records,
            pull_requests: pull_requests.records,
            issues: issues.records,
            comments: comments.records,
            snapshot,
        };
        let counts = (
            staged.commits.len(),
            staged.pull_requests.len(),
            staged.issues.len(),
            staged.comments.len(),
        );
        let store = Arc::clone(&self.store);
        let repo_id = tokio::task::spawn_blocking(move || staged.flush(store.as_ref())).await??;
        progress.send(SourceKind::Persist, 1, 1, "Results saved");

        drop(progress);
        if let Err(e) = board.await {
            warn!("Progress reporter stopped early: {e}");
        }

        let (commits, pull_requests, issues, comment_count) = counts;
        Ok(AnalysisSummary {
            repository: repo,
            repo_id,
            commits,
            pull_requests,
            issues,
            comments: comment_count,
            comments_unavailable: comments.unavailable,
            scoring_fallbacks,
            code_quality,
            contributors: ledger.into_aggregates(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn code_quality(
        &self,
        repo: &RepositoryRef,
        progress: &progress::ProgressHandle,
    ) -> (Option<CodeQualitySnapshot>, CodeQualityOutcome) {
        let Some(source) = &self.code_source else {
            return (None, CodeQualityOutcome::Skipped);
        };

        progress.send(SourceKind::CodeQuality, 0, 1, "Analyzing source tree");
        let result = source.analyze(repo).join().await;
        progress.send(SourceKind::CodeQuality, 1, 1, "Source tree analyzed");

        let mut snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Code quality unavailable for {}: {e}", repo.full_name());
                return (
                    None,
                    CodeQualityOutcome::Unavailable {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let outcome = match &mut snapshot {
            CodeQualitySnapshot::Empty(empty) => CodeQualityOutcome::Empty {
                language: empty.language.clone(),
            },
            CodeQualitySnapshot::Analyzed(report) => {
                if self.config.code_insights {
                    match InsightMetrics::from_report(report) {
                        Some(metrics) => {
                            report.insights = Some(self.scorer.code_insights(&metrics).await);
                        }
                        None => warn!(
                            "No analyzable files in {}; skipping code insights",
                            repo.full_name()
                        ),
                    }
                }
                let averages = report.averages.as_ref();
                CodeQualityOutcome::Analyzed {
                    score: averages.map(|a| a.score),
                    files_analyzed: report.files.len(),
                    files_failed: report.failures.len(),
                    complexity_grade: averages.map(|a| a.complexity_grade),
                    maintainability_grade: averages.map(|a| a.maintainability_grade),
                }
            }
        };
        (Some(snapshot), outcome)
    }
}

/// Everything a run writes, held until the flush.
struct Staged {
    repository: RepositoryRef,
    commits: Vec<types::CommitRecord>,
    pull_requests: Vec<types::PullRequestRecord>,
    issues: Vec<types::IssueRecord>,
    comments: Vec<types::CommentRecord>,
    snapshot: Option<CodeQualitySnapshot>,
}

impl Staged {
    fn flush(self, store: &dyn PersistenceGateway) -> Result<RepoId, StoreError> {
        let id = store.upsert_repository(&self.repository)?;
        store.replace_commits(&id, &self.commits)?;
        store.replace_pull_requests(&id, &self.pull_requests)?;
        store.replace_issues(&id, &self.issues)?;
        store.replace_comments(&id, &self.comments)?;
        if let Some(snapshot) = &self.snapshot {
            store.replace_code_quality(&id, snapshot)?;
        }
        info!(
            "Saved {} commits, {} pull requests, {} issues, {} comments for {id}",
            self.commits.len(),
            self.pull_requests.len(),
            self.issues.len(),
            self.comments.len()
        );
        Ok(id)
    }
}
