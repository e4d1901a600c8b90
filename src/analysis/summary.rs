use crate::analysis::code_quality::types::Grade;
use crate::analysis::contributors::ContributorAggregate;
use crate::analysis::types::RepositoryRef;
use crate::store::RepoId;
use serde::Serialize;
use std::fmt::Write;

/// What happened to the code quality stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CodeQualityOutcome {
    /// No code source was configured.
    Skipped,
    /// The tree could not be fetched; any stored snapshot was left alone.
    Unavailable { reason: String },
    /// The tree has no file in the target language.
    Empty { language: String },
    /// Score and grades are `None` when no file could be analyzed.
    Analyzed {
        score: Option<f64>,
        files_analyzed: usize,
        files_failed: usize,
        complexity_grade: Option<Grade>,
        maintainability_grade: Option<Grade>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub repository: RepositoryRef,
    pub repo_id: RepoId,
    pub commits: usize,
    pub pull_requests: usize,
    pub issues: usize,
    pub comments: usize,
    pub comments_unavailable: usize,
    pub scoring_fallbacks: usize,
    pub code_quality: CodeQualityOutcome,
    pub contributors: Vec<ContributorAggregate>,
    pub elapsed_ms: u64,
}

fn average(avg: Option<f64>) -> String {
    avg.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

impl AnalysisSummary {
    /// Plain-text report for terminals.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Repository: {}", self.repository.html_url);
        let _ = writeln!(
            out,
            "Analyzed {} commits, {} pull requests, {} issues, {} comments in {:.1}s",
            self.commits,
            self.pull_requests,
            self.issues,
            self.comments,
            self.elapsed_ms as f64 / 1000.0
        );
        if self.scoring_fallbacks > 0 {
            let _ = writeln!(
                out,
                "Scoring fell back to neutral for {} items",
                self.scoring_fallbacks
            );
        }
        if self.comments_unavailable > 0 {
            let _ = writeln!(
                out,
                "Comments unavailable for {} items",
                self.comments_unavailable
            );
        }

        match &self.code_quality {
            CodeQualityOutcome::Skipped => {
                let _ = writeln!(out, "Code quality: skipped");
            }
            CodeQualityOutcome::Unavailable { reason } => {
                let _ = writeln!(out, "Code quality: unavailable ({reason})");
            }
            CodeQualityOutcome::Empty { language } => {
                let _ = writeln!(out, "Code quality: no {language} files found");
            }
            CodeQualityOutcome::Analyzed {
                score,
                files_analyzed,
                files_failed,
                complexity_grade,
                maintainability_grade,
            } => {
                match (score, complexity_grade, maintainability_grade) {
                    (Some(score), Some(cc), Some(mi)) => {
                        let _ = writeln!(
                            out,
                            "Code quality: {score:.1}/10 over {files_analyzed} files \
                             (complexity {cc}, maintainability {mi})"
                        );
                    }
                    _ => {
                        let _ = writeln!(out, "Code quality: no analyzable files");
                    }
                }
                if *files_failed > 0 {
                    let _ = writeln!(out, "  {files_failed} files could not be analyzed");
                }
            }
        }

        let _ = writeln!(out, "\nContributors ({}):", self.contributors.len());
        let _ = writeln!(
            out,
            "  {:<24} {:>7} {:>6} {:>5} {:>6} {:>8} {:>9} {:>6} {:>6} {:>6}",
            "login", "commits", "size", "prs", "merged", "issues", "comments", "c.q", "pr.q", "i.q"
        );
        for c in &self.contributors {
            let _ = writeln!(
                out,
                "  {:<24} {:>7} {:>6} {:>5} {:>6} {:>8} {:>9} {:>6} {:>6} {:>6}",
                c.contributor.login,
                c.commit_count,
                average(c.avg_commit_size()),
                c.pr_count,
                c.merged_pr_count,
                c.issue_count,
                c.pr_comment_count + c.issue_comment_count,
                average(c.avg_commit_quality()),
                average(c.avg_pr_quality()),
                average(c.avg_issue_quality()),
            );
        }
        out
    }
}
