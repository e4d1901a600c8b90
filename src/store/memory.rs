use super::{PersistenceGateway, RepoId, StoreError, StoredRepository};
use crate::analysis::code_quality::CodeQualitySnapshot;
use crate::analysis::types::{
    CommentRecord, CommitRecord, IssueRecord, PullRequestRecord, RepositoryRef,
};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    repos: RwLock<BTreeMap<RepoId, StoredRepository>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update(
        &self,
        id: &RepoId,
        apply: impl FnOnce(&mut StoredRepository),
    ) -> Result<(), StoreError> {
        let mut repos = self.repos.write().map_err(|_| StoreError::Poisoned)?;
        let stored = repos
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownRepository(id.clone()))?;
        apply(stored);
        Ok(())
    }
}

impl PersistenceGateway for MemoryStore {
    fn upsert_repository(&self, repo: &RepositoryRef) -> Result<RepoId, StoreError> {
        let id = RepoId::for_repo(repo);
        let mut repos = self.repos.write().map_err(|_| StoreError::Poisoned)?;
        repos
            .entry(id.clone())
            .and_modify(|stored| stored.repository = repo.clone())
            .or_insert_with(|| StoredRepository::new(repo.clone()));
        Ok(id)
    }

    fn replace_commits(&self, id: &RepoId, commits: &[CommitRecord]) -> Result<(), StoreError> {
        self.update(id, |s| s.commits = commits.to_vec())
    }

    fn replace_pull_requests(
        &self,
        id: &RepoId,
        pull_requests: &[PullRequestRecord],
    ) -> Result<(), StoreError> {
        self.update(id, |s| s.pull_requests = pull_requests.to_vec())
    }

    fn replace_issues(&self, id: &RepoId, issues: &[IssueRecord]) -> Result<(), StoreError> {
        self.update(id, |s| s.issues = issues.to_vec())
    }

    fn replace_comments(&self, id: &RepoId, comments: &[CommentRecord]) -> Result<(), StoreError> {
        self.update(id, |s| s.comments = comments.to_vec())
    }

    fn replace_code_quality(
        &self,
        id: &RepoId,
        snapshot: &CodeQualitySnapshot,
    ) -> Result<(), StoreError> {
        self.update(id, |s| s.code_quality = Some(snapshot.clone()))
    }

    fn get_repository_by_owner_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<StoredRepository>, StoreError> {
        self.load(&RepoId::new(owner, name))
    }

    fn load(&self, id: &RepoId) -> Result<Option<StoredRepository>, StoreError> {
        let repos = self.repos.read().map_err(|_| StoreError::Poisoned)?;
        Ok(repos.get(id).cloned())
    }
}
