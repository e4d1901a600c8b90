//! One pretty-printed JSON document per repository.

use super::{PersistenceGateway, RepoId, StoreError, StoredRepository};
use crate::analysis::code_quality::CodeQualitySnapshot;
use crate::analysis::types::{
    CommentRecord, CommitRecord, IssueRecord, PullRequestRecord, RepositoryRef,
};
use log::debug;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for `id`; anything outside `[A-Za-z0-9._-]` becomes `_`.
    #[must_use]
    pub fn document_path(&self, id: &RepoId) -> PathBuf {
        let stem: String = id
            .as_str()
            .replace('/', "__")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{stem}.json"))
    }

    fn read(&self, id: &RepoId) -> Result<Option<StoredRepository>, StoreError> {
        match fs::read(self.document_path(id)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a temp file in the same directory, then rename over the
    /// document so readers never see a partial write.
    fn write(&self, stored: &StoredRepository) -> Result<(), StoreError> {
        let path = self.document_path(&stored.id);
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, stored)?;
            writer.flush()?;
        }
        temp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn update(
        &self,
        id: &RepoId,
        apply: impl FnOnce(&mut StoredRepository),
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stored = self
            .read(id)?
            .ok_or_else(|| StoreError::UnknownRepository(id.clone()))?;
        apply(&mut stored);
        self.write(&stored)
    }
}

impl PersistenceGateway for JsonFileStore {
    fn upsert_repository(&self, repo: &RepositoryRef) -> Result<RepoId, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let id = RepoId::for_repo(repo);
        let stored = match self.read(&id)? {
            Some(mut existing) => {
                existing.repository = repo.clone();
                existing
            }
            None => StoredRepository::new(repo.clone()),
        };
        self.write(&stored)?;
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
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.read(id)
    }
}
