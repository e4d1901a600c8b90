//! Raw GitHub REST payloads and their translation into normalized records.
//!
//! Only the fields the pipeline reads are declared; everything is tolerant of
//! missing or null values since GitHub omits them for ghost users, empty
//! repositories and partially loaded list items.

use crate::analysis::types::{
    CommentKind, CommentParent, CommentRecord, ContributorRef, IssueState, PullRequestState,
    RawCommit, RawIssue, RawPullRequest, RepositoryRef,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUser {
    pub login: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

fn contributor(user: Option<&WireUser>) -> ContributorRef {
    ContributorRef::from_login(
        user.and_then(|u| u.login.as_deref()),
        user.and_then(|u| u.name.as_deref()),
    )
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRepository {
    pub id: u64,
    pub name: String,
    pub owner: WireUser,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub clone_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireBranch {
    pub commit: WireShaOnly,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireShaOnly {
    pub sha: String,
}

impl WireRepository {
    pub fn into_ref(self, head_commit: Option<String>) -> RepositoryRef {
        let owner = self.owner.login.unwrap_or_default();
        let html_url = self
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{owner}/{}", self.name));
        let clone_url = self.clone_url.unwrap_or_else(|| format!("{html_url}.git"));
        RepositoryRef {
            owner,
            name: self.name,
            default_branch: self.default_branch.unwrap_or_else(|| "main".to_string()),
            head_commit,
            clone_url,
            html_url,
            description: self.description,
            provider_id: self.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Rate limit
// ---------------------------------------------------------------------------

/// Body of a non-2xx answer.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRateLimit {
    pub resources: WireRateResources,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRateResources {
    pub core: WireRate,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRate {
    pub remaining: u64,
    /// Epoch seconds.
    pub reset: i64,
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireCommit {
    pub sha: String,
    pub commit: WireGitCommit,
    #[serde(default)]
    pub author: Option<WireUser>,
    #[serde(default)]
    pub stats: Option<WireStats>,
    #[serde(default)]
    pub files: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireGitCommit {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<WireGitSignature>,
    #[serde(default)]
    pub committer: Option<WireGitSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireGitSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct WireStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

impl WireCommit {
    pub fn into_raw(self) -> RawCommit {
        let stats = self.stats.unwrap_or_default();
        let files_changed = self.files.as_ref().map_or(0, |f| f.len() as u64);
        let git_author = self.commit.author.as_ref();
        let committed_at = git_author
            .and_then(|a| a.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let mut author = contributor(self.author.as_ref());
        if author.display_name.is_none() && !author.is_unknown() {
            author.display_name = git_author.and_then(|a| a.name.clone());
        }
        RawCommit {
            sha: self.sha,
            author,
            message: self.commit.message,
            additions: stats.additions,
            deletions: stats.deletions,
            files_changed,
            committed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WirePullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub user: Option<WireUser>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    // Only present on the single-PR endpoint.
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default)]
    pub changed_files: Option<u64>,
    #[serde(default)]
    pub comments: Option<u64>,
    #[serde(default)]
    pub review_comments: Option<u64>,
    #[serde(default)]
    pub merged_by: Option<WireUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireReview {
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub state: String,
}

impl WirePullRequest {
    pub fn into_raw(self, approvers: Vec<String>) -> RawPullRequest {
        let state = if self.merged_at.is_some() {
            PullRequestState::Merged
        } else if self.state.eq_ignore_ascii_case("open") {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        };
        RawPullRequest {
            number: self.number,
            author: contributor(self.user.as_ref()),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            state,
            created_at: self.created_at,
            closed_at: self.closed_at,
            merged_at: self.merged_at,
            additions: self.additions.unwrap_or(0),
            deletions: self.deletions.unwrap_or(0),
            changed_files: self.changed_files.unwrap_or(0),
            comments: self.comments.unwrap_or(0),
            review_comments: self.review_comments.unwrap_or(0),
            merged_by: self
                .merged_by
                .as_ref()
                .filter(|u| u.login.is_some())
                .map(|u| contributor(Some(u))),
            approvers,
        }
    }
}

/// Logins of reviewers whose review state is `APPROVED`, first occurrence wins.
pub(crate) fn approvers(reviews: &[WireReview]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for review in reviews {
        if !review.state.eq_ignore_ascii_case("APPROVED") {
            continue;
        }
        let Some(login) = review.user.as_ref().and_then(|u| u.login.as_ref()) else {
            continue;
        };
        if !out.iter().any(|l| l == login) {
            out.push(login.clone());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireIssue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub user: Option<WireUser>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub assignees: Vec<WireUser>,
    #[serde(default)]
    pub labels: Vec<WireLabel>,
    /// Set when the issue is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireLabel {
    #[serde(default)]
    pub name: Option<String>,
}

impl WireIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn into_raw(self) -> RawIssue {
        RawIssue {
            number: self.number,
            author: contributor(self.user.as_ref()),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            state: if self.state.eq_ignore_ascii_case("open") {
                IssueState::Open
            } else {
                IssueState::Closed
            },
            created_at: self.created_at,
            closed_at: self.closed_at,
            comments: self.comments,
            assignees: self.assignees.into_iter().filter_map(|u| u.login).collect(),
            labels: self.labels.into_iter().filter_map(|l| l.name).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireComment {
    pub id: u64,
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WireComment {
    pub fn into_record(self, parent: CommentParent, kind: CommentKind) -> CommentRecord {
        CommentRecord {
            id: self.id,
            parent,
            kind,
            author: contributor(self.user.as_ref()),
            body: self.body.unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}
