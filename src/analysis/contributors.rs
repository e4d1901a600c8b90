//! Per-contributor aggregation.
//!
//! Each analyzer owns a [`ContributorLedger`] and bumps it once per record it
//! emits. Ledgers are merged in a single reduction after every wave has
//! finished, so no aggregate is ever shared between tasks.

use crate::analysis::types::{
    CommentParent, CommentRecord, CommitRecord, ContributorRef, IssueRecord, PullRequestRecord,
    PullRequestState, QualityScore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running sum of quality scores. Fallbacks are always counted; whether they
/// enter the sum depends on the ledger that recorded them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySamples {
    pub sum: f64,
    pub samples: u64,
    pub fallbacks: u64,
}

impl QualitySamples {
    fn record(&mut self, score: &QualityScore, exclude_fallback: bool) {
        if score.is_fallback {
            self.fallbacks += 1;
            if exclude_fallback {
                return;
            }
        }
        self.sum += score.value;
        self.samples += 1;
    }

    fn merge(&mut self, other: &QualitySamples) {
        self.sum += other.sum;
        self.samples += other.samples;
        self.fallbacks += other.fallbacks;
    }

    /// Mean of the sampled scores, `None` when nothing was sampled.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.sum / self.samples as f64)
    }
}

/// Derived totals for one contributor. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorAggregate {
    pub contributor: ContributorRef,
    pub commit_count: u64,
    pub additions: u64,
    pub deletions: u64,
    pub pr_count: u64,
    pub merged_pr_count: u64,
    pub pr_comment_count: u64,
    pub issue_count: u64,
    pub issue_comment_count: u64,
    pub commit_quality: QualitySamples,
    pub pr_quality: QualitySamples,
    pub issue_quality: QualitySamples,
}

impl ContributorAggregate {
    #[must_use]
    pub fn new(contributor: ContributorRef) -> Self {
        Self {
            contributor,
            commit_count: 0,
            additions: 0,
            deletions: 0,
            pr_count: 0,
            merged_pr_count: 0,
            pr_comment_count: 0,
            issue_count: 0,
            issue_comment_count: 0,
            commit_quality: QualitySamples::default(),
            pr_quality: QualitySamples::default(),
            issue_quality: QualitySamples::default(),
        }
    }

    #[must_use]
    pub fn avg_commit_quality(&self) -> Option<f64> {
        self.commit_quality.average()
    }

    #[must_use]
    pub fn avg_pr_quality(&self) -> Option<f64> {
        self.pr_quality.average()
    }

    #[must_use]
    pub fn avg_issue_quality(&self) -> Option<f64> {
        self.issue_quality.average()
    }

    #[must_use]
    pub fn lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }

    /// Mean additions + deletions per commit, `None` without commits.
    #[must_use]
    pub fn avg_commit_size(&self) -> Option<f64> {
        (self.commit_count > 0).then(|| self.lines_changed() as f64 / self.commit_count as f64)
    }

    /// Commits + PRs + issues + comments of either kind.
    #[must_use]
    pub fn total_contributions(&self) -> u64 {
        self.commit_count
            + self.pr_count
            + self.issue_count
            + self.pr_comment_count
            + self.issue_comment_count
    }

    fn merge(&mut self, other: &ContributorAggregate) {
        if self.contributor.display_name.is_none() {
            self.contributor
                .display_name
                .clone_from(&other.contributor.display_name);
        }
        self.commit_count += other.commit_count;
        self.additions += other.additions;
        self.deletions += other.deletions;
        self.pr_count += other.pr_count;
        self.merged_pr_count += other.merged_pr_count;
        self.pr_comment_count += other.pr_comment_count;
        self.issue_count += other.issue_count;
        self.issue_comment_count += other.issue_comment_count;
        self.commit_quality.merge(&other.commit_quality);
        self.pr_quality.merge(&other.pr_quality);
        self.issue_quality.merge(&other.issue_quality);
    }
}

/// Contributor deltas keyed by login.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributorLedger {
    entries: BTreeMap<String, ContributorAggregate>,
    exclude_fallback: bool,
}

impl ContributorLedger {
    /// `exclude_fallback` keeps fallback scores out of the quality sums.
    #[must_use]
    pub fn new(exclude_fallback: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            exclude_fallback,
        }
    }

    /// Resolve-or-create the aggregate for `who`.
    pub fn entry(&mut self, who: &ContributorRef) -> &mut ContributorAggregate {
        let aggregate = self
            .entries
            .entry(who.login.clone())
            .or_insert_with(|| ContributorAggregate::new(who.clone()));
        if aggregate.contributor.display_name.is_none() && who.display_name.is_some() {
            aggregate.contributor.display_name.clone_from(&who.display_name);
        }
        aggregate
    }

    pub fn record_commit(&mut self, commit: &CommitRecord) {
        let exclude = self.exclude_fallback;
        let agg = self.entry(&commit.author);
        agg.commit_count += 1;
        agg.additions += commit.additions;
        agg.deletions += commit.deletions;
        agg.commit_quality.record(&commit.quality, exclude);
    }

    pub fn record_pull_request(&mut self, pr: &PullRequestRecord) {
        let exclude = self.exclude_fallback;
        let agg = self.entry(&pr.author);
        agg.pr_count += 1;
        if pr.state == PullRequestState::Merged {
            agg.merged_pr_count += 1;
        }
        agg.pr_quality.record(&pr.quality, exclude);
    }

    pub fn record_issue(&mut self, issue: &IssueRecord) {
        let exclude = self.exclude_fallback;
        let agg = self.entry(&issue.author);
        agg.issue_count += 1;
        agg.issue_quality.record(&issue.quality, exclude);
    }

    pub fn record_comment(&mut self, comment: &CommentRecord) {
        let agg = self.entry(&comment.author);
        match comment.parent {
            CommentParent::PullRequest(_) => agg.pr_comment_count += 1,
            CommentParent::Issue(_) => agg.issue_comment_count += 1,
        }
    }

    /// Fold another ledger's deltas into this one.
    pub fn merge(&mut self, other: ContributorLedger) {
        for (login, theirs) in other.entries {
            match self.entries.get_mut(&login) {
                Some(ours) => ours.merge(&theirs),
                None => {
                    self.entries.insert(login, theirs);
                }
            }
        }
    }

    #[must_use]
    pub fn get(&self, login: &str) -> Option<&ContributorAggregate> {
        self.entries.get(login)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregates ordered by total contributions, most active first; ties
    /// break on login.
    #[must_use]
    pub fn into_aggregates(self) -> Vec<ContributorAggregate> {
        let mut all: Vec<ContributorAggregate> = self.entries.into_values().collect();
        all.sort_by(|a, b| {
            b.total_contributions()
                .cmp(&a.total_contributions())
                .then_with(|| a.contributor.login.cmp(&b.contributor.login))
        });
        all
    }
}
