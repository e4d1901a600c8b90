//! Persistence gateway for analysis results.
//!
//! Every write replaces one entity type of one repository as a unit, so a
//! re-run with identical input leaves the store unchanged.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::analysis::code_quality::CodeQualitySnapshot;
use crate::analysis::types::{
    CommentRecord, CommitRecord, IssueRecord, PullRequestRecord, RepositoryRef,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("repository {0} has not been stored")]
    UnknownRepository(RepoId),
}

/// Stable key of a stored repository: lowercase `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoId(String);

impl RepoId {
    #[must_use]
    pub fn new(owner: &str, name: &str) -> Self {
        Self(format!("{}/{}", owner.to_lowercase(), name.to_lowercase()))
    }

    #[must_use]
    pub fn for_repo(repo: &RepositoryRef) -> Self {
        Self::new(&repo.owner, &repo.name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything stored for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRepository {
    pub id: RepoId,
    pub repository: RepositoryRef,
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRecord>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub code_quality: Option<CodeQualitySnapshot>,
}

impl StoredRepository {
    #[must_use]
    pub fn new(repository: RepositoryRef) -> Self {
        Self {
            id: RepoId::for_repo(&repository),
            repository,
            commits: Vec::new(),
            pull_requests: Vec::new(),
            issues: Vec::new(),
            comments: Vec::new(),
            code_quality: None,
        }
    }
}

/// Read/write contract the pipeline flushes into.
pub trait PersistenceGateway: Send + Sync {
    /// Insert the repository or refresh its metadata; stored entities are kept.
    fn upsert_repository(&self, repo: &RepositoryRef) -> Result<RepoId, StoreError>;

    fn replace_commits(&self, id: &RepoId, commits: &[CommitRecord]) -> Result<(), StoreError>;

    fn replace_pull_requests(
        &self,
        id: &RepoId,
        pull_requests: &[PullRequestRecord],
    ) -> Result<(), StoreError>;

    fn replace_issues(&self, id: &RepoId, issues: &[IssueRecord]) -> Result<(), StoreError>;

    fn replace_comments(&self, id: &RepoId, comments: &[CommentRecord]) -> Result<(), StoreError>;

    fn replace_code_quality(
        &self,
        id: &RepoId,
        snapshot: &CodeQualitySnapshot,
    ) -> Result<(), StoreError>;

    fn get_repository_by_owner_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<StoredRepository>, StoreError>;

    fn load(&self, id: &RepoId) -> Result<Option<StoredRepository>, StoreError>;
}
