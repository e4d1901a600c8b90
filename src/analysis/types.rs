//! Normalized record shapes shared by the adapter, analyzers and store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login used when the provider reports no attributable author.
pub const UNKNOWN_CONTRIBUTOR: &str = "unknown";

/// Neutral score substituted whenever qualitative scoring fails.
pub const FALLBACK_SCORE: f64 = 5.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Identifies the analysis target. Immutable once a run starts.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub head_commit: Option<String>,
    pub clone_url: String,
    pub html_url: String,
    pub description: Option<String>,
    pub provider_id: u64,
}

impl RepositoryRef {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A unique author identity, keyed by login.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributorRef {
    pub login: String,
    pub display_name: Option<String>,
}

impl ContributorRef {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_CONTRIBUTOR)
    }

    /// Map an optional provider login onto a contributor, never producing an
    /// empty key.
    #[must_use]
    pub fn from_login(login: Option<&str>, display_name: Option<&str>) -> Self {
        match login.map(str::trim).filter(|l| !l.is_empty()) {
            Some(login) => Self {
                login: login.to_string(),
                display_name: display_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            },
            None => Self::unknown(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.login == UNKNOWN_CONTRIBUTOR
    }
}

impl fmt::Display for ContributorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.login)
    }
}

/// A 0-10 rating with feedback, as produced by the quality scorer.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct QualityScore {
    pub value: f64,
    pub feedback: String,
    pub is_fallback: bool,
}

impl QualityScore {
    /// Clamp `value` into range. Non-finite input cannot be rated and becomes
    /// the fallback.
    pub fn new(value: f64, feedback: impl Into<String>) -> Self {
        if !value.is_finite() {
            return Self::fallback("score was not a finite number");
        }
        Self {
            value: value.clamp(MIN_SCORE, MAX_SCORE),
            feedback: feedback.into(),
            is_fallback: false,
        }
    }

    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            value: FALLBACK_SCORE,
            feedback: reason.into(),
            is_fallback: true,
        }
    }
}

// ============================================================================
// Provider-normalized records (adapter output, before scoring)
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RawCommit {
    pub sha: String,
    pub author: ContributorRef,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
    pub files_changed: u64,
    pub committed_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequestState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RawPullRequest {
    pub number: u64,
    pub author: ContributorRef,
    pub title: String,
    pub body: String,
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub comments: u64,
    pub review_comments: u64,
    pub merged_by: Option<ContributorRef>,
    pub approvers: Vec<String>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RawIssue {
    pub number: u64,
    pub author: ContributorRef,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub comments: u64,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
}

// ============================================================================
// Analyzed records (persisted)
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CommitRecord {
    pub sha: String,
    pub author: ContributorRef,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
    pub files_changed: u64,
    pub committed_at: DateTime<Utc>,
    pub quality: QualityScore,
}

impl CommitRecord {
    #[must_use]
    pub fn lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub author: ContributorRef,
    pub title: String,
    pub body: String,
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub comments: u64,
    pub review_comments: u64,
    pub merged_by: Option<ContributorRef>,
    pub approvers: Vec<String>,
    pub linked_to_issue: bool,
    pub quality: QualityScore,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct IssueRecord {
    pub number: u64,
    pub author: ContributorRef,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub comments: u64,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub quality: QualityScore,
}

/// Which entity a comment hangs off. PR and issue numbers are separate
/// namespaces as far as the pipeline is concerned.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case", tag = "type", content = "number")]
pub enum CommentParent {
    PullRequest(u64),
    Issue(u64),
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// Conversation comment on an issue or PR.
    IssueComment,
    /// Inline code review comment on a PR diff.
    ReviewComment,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CommentRecord {
    pub id: u64,
    pub parent: CommentParent,
    pub kind: CommentKind,
    pub author: ContributorRef,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
