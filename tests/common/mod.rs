//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use repo_insights::analysis::code_quality::CodeQualitySnapshot;
use repo_insights::analysis::progress::ProgressFn;
use repo_insights::analysis::types::{
    CommentKind, CommentParent, CommentRecord, CommitRecord, ContributorRef, IssueRecord,
    IssueState, PullRequestRecord, PullRequestState, RawCommit, RawIssue, RawPullRequest,
    RepositoryRef,
};
use repo_insights::llm::{CompletionBackend, LlmError, Prompt, QualityScorer};
use repo_insights::runtime::{AsyncStream, AsyncTask};
use repo_insights::store::{MemoryStore, PersistenceGateway, RepoId, StoreError, StoredRepository};
use repo_insights::{GitHubError, SourceProvider};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

pub fn repo() -> RepositoryRef {
    RepositoryRef {
        owner: "octo".to_string(),
        name: "widgets".to_string(),
        default_branch: "main".to_string(),
        head_commit: Some("abc123".to_string()),
        clone_url: "https://github.com/octo/widgets.git".to_string(),
        html_url: "https://github.com/octo/widgets".to_string(),
        description: Some("Widgets for everyone".to_string()),
        provider_id: 42,
    }
}

pub fn commit(sha: &str, login: &str, message: &str, additions: u64, deletions: u64) -> RawCommit {
    RawCommit {
        sha: sha.to_string(),
        author: ContributorRef::new(login),
        message: message.to_string(),
        additions,
        deletions,
        files_changed: 1,
        committed_at: at(1),
    }
}

pub fn pull_request(number: u64, login: &str, title: &str, body: &str) -> RawPullRequest {
    RawPullRequest {
        number,
        author: ContributorRef::new(login),
        title: title.to_string(),
        body: body.to_string(),
        state: PullRequestState::Open,
        created_at: at(2),
        closed_at: None,
        merged_at: None,
        additions: 10,
        deletions: 2,
        changed_files: 1,
        comments: 0,
        review_comments: 0,
        merged_by: None,
        approvers: Vec::new(),
    }
}

pub fn merged(mut pr: RawPullRequest, by: &str) -> RawPullRequest {
    pr.state = PullRequestState::Merged;
    pr.merged_at = Some(at(3));
    pr.closed_at = Some(at(3));
    pr.merged_by = Some(ContributorRef::new(by));
    pr
}

pub fn issue(number: u64, login: &str, title: &str, body: &str) -> RawIssue {
    RawIssue {
        number,
        author: ContributorRef::new(login),
        title: title.to_string(),
        body: body.to_string(),
        state: IssueState::Open,
        created_at: at(4),
        closed_at: None,
        comments: 0,
        assignees: Vec::new(),
        labels: Vec::new(),
    }
}

pub fn comment(id: u64, parent: CommentParent, login: &str) -> CommentRecord {
    CommentRecord {
        id,
        parent,
        kind: CommentKind::IssueComment,
        author: ContributorRef::new(login),
        body: format!("comment {id}"),
        created_at: at(5),
    }
}

// ============================================================================
// Provider
// ============================================================================

/// What a mock stream does after its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    Done,
    RateLimited,
    Unauthorized,
}

fn tail_error(tail: Tail) -> Option<GitHubError> {
    match tail {
        Tail::Done => None,
        Tail::RateLimited => Some(GitHubError::RateLimit {
            reset_at: None,
            retries: 3,
        }),
        Tail::Unauthorized => Some(GitHubError::Auth("bad credentials".to_string())),
    }
}

fn stream_of<T: Send + 'static>(
    items: Vec<T>,
    tail: Tail,
    progress: ProgressFn,
) -> AsyncStream<Result<T, GitHubError>> {
    AsyncStream::spawn(move |tx| async move {
        let total = items.len() as u64;
        for (i, item) in items.into_iter().enumerate() {
            if !tx.send(Ok(item)) {
                return;
            }
            progress(i as u64 + 1, total, "mock page");
        }
        if let Some(e) = tail_error(tail) {
            tx.send(Err(e));
            return;
        }
        progress(total, total, "mock done");
    })
}

#[derive(Clone)]
pub struct MockProvider {
    pub repo: RepositoryRef,
    pub commits: Vec<RawCommit>,
    pub pull_requests: Vec<RawPullRequest>,
    pub issues: Vec<RawIssue>,
    pub comments: HashMap<CommentParent, Vec<CommentRecord>>,
    pub broken_threads: HashSet<CommentParent>,
    pub commit_tail: Tail,
    pub missing: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            repo: repo(),
            commits: Vec::new(),
            pull_requests: Vec::new(),
            issues: Vec::new(),
            comments: HashMap::new(),
            broken_threads: HashSet::new(),
            commit_tail: Tail::Done,
            missing: false,
        }
    }

    pub fn with_commits(mut self, commits: Vec<RawCommit>) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_pull_requests(mut self, prs: Vec<RawPullRequest>) -> Self {
        self.pull_requests = prs;
        self
    }

    pub fn with_issues(mut self, issues: Vec<RawIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_comments(mut self, parent: CommentParent, comments: Vec<CommentRecord>) -> Self {
        self.comments.insert(parent, comments);
        self
    }

    pub fn with_broken_thread(mut self, parent: CommentParent) -> Self {
        self.broken_threads.insert(parent);
        self
    }

    pub fn with_commit_tail(mut self, tail: Tail) -> Self {
        self.commit_tail = tail;
        self
    }

    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    fn thread(&self, parent: CommentParent) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
        if self.broken_threads.contains(&parent) {
            return AsyncTask::ready(Err(GitHubError::Api("thread unavailable".to_string())));
        }
        AsyncTask::ready(Ok(self.comments.get(&parent).cloned().unwrap_or_default()))
    }
}

impl SourceProvider for MockProvider {
    fn repository(&self, owner: &str, name: &str) -> AsyncTask<Result<RepositoryRef, GitHubError>> {
        if self.missing {
            return AsyncTask::ready(Err(GitHubError::NotFound(format!(
                "Repository or resource not found: {owner}/{name}"
            ))));
        }
        AsyncTask::ready(Ok(self.repo.clone()))
    }

    fn commits(
        &self,
        _repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawCommit, GitHubError>> {
        stream_of(self.commits.clone(), self.commit_tail, progress)
    }

    fn pull_requests(
        &self,
        _repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawPullRequest, GitHubError>> {
        stream_of(self.pull_requests.clone(), Tail::Done, progress)
    }

    fn issues(
        &self,
        _repo: &RepositoryRef,
        progress: ProgressFn,
    ) -> AsyncStream<Result<RawIssue, GitHubError>> {
        stream_of(self.issues.clone(), Tail::Done, progress)
    }

    fn pull_request_comments(
        &self,
        _repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
        self.thread(CommentParent::PullRequest(number))
    }

    fn issue_comments(
        &self,
        _repo: &RepositoryRef,
        number: u64,
    ) -> AsyncTask<Result<Vec<CommentRecord>, GitHubError>> {
        self.thread(CommentParent::Issue(number))
    }
}

// ============================================================================
// Completion backend
// ============================================================================

type Reply = dyn Fn(&Prompt) -> Result<String, LlmError> + Send + Sync;

/// Deterministic completion backend driven by a closure.
pub struct MockBackend {
    reply: Box<Reply>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(reply: impl Fn(&Prompt) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with `text`.
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Scores every prompt `score`, except pull request prompts, which get
    /// a reply that is not JSON.
    pub fn malformed_for_pull_requests(score: f64) -> Self {
        Self::new(move |prompt| {
            if prompt.user.contains("Pull Request") {
                Ok("I'd say it's pretty good!".to_string())
            } else {
                Ok(format!(r#"{{"score": {score}, "feedback": "ok"}}"#))
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionBackend for MockBackend {
    fn complete(&self, prompt: &Prompt) -> AsyncTask<Result<String, LlmError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        AsyncTask::ready((self.reply)(prompt))
    }
}

pub fn scorer(backend: MockBackend) -> QualityScorer {
    QualityScorer::new(Arc::new(backend))
}

// ============================================================================
// Store
// ============================================================================

/// A [`MemoryStore`] that counts write calls.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl PersistenceGateway for CountingStore {
    fn upsert_repository(&self, repo: &RepositoryRef) -> Result<RepoId, StoreError> {
        self.bump();
        self.inner.upsert_repository(repo)
    }

    fn replace_commits(&self, id: &RepoId, commits: &[CommitRecord]) -> Result<(), StoreError> {
        self.bump();
        self.inner.replace_commits(id, commits)
    }

    fn replace_pull_requests(
        &self,
        id: &RepoId,
        pull_requests: &[PullRequestRecord],
    ) -> Result<(), StoreError> {
        self.bump();
        self.inner.replace_pull_requests(id, pull_requests)
    }

    fn replace_issues(&self, id: &RepoId, issues: &[IssueRecord]) -> Result<(), StoreError> {
        self.bump();
        self.inner.replace_issues(id, issues)
    }

    fn replace_comments(&self, id: &RepoId, comments: &[CommentRecord]) -> Result<(), StoreError> {
        self.bump();
        self.inner.replace_comments(id, comments)
    }

    fn replace_code_quality(
        &self,
        id: &RepoId,
        snapshot: &CodeQualitySnapshot,
    ) -> Result<(), StoreError> {
        self.bump();
        self.inner.replace_code_quality(id, snapshot)
    }

    fn get_repository_by_owner_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<StoredRepository>, StoreError> {
        self.inner.get_repository_by_owner_name(owner, name)
    }

    fn load(&self, id: &RepoId) -> Result<Option<StoredRepository>, StoreError> {
        self.inner.load(id)
    }
}
