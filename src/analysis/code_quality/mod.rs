//! Static code analysis over a repository's object database.
//!
//! The repository is fetched as a bare, depth-1 clone into a temporary
//! directory; trees and blobs are then read straight from the object store,
//! so no working tree is ever checked out.

pub mod error;
pub mod languages;
pub mod object_store;
pub mod python;
pub mod traversal;
pub mod types;

pub use error::CodeAnalysisError;
pub use object_store::{GixObjectStore, MemoryObjectStore, ObjectId, ObjectStore};
pub use traversal::{aggregate_score, analyze_tree};
pub use types::{
    CodeQualityReport, CodeQualitySnapshot, EmptySnapshot, FileAnalysisError, QualityAverages,
};

use crate::analysis::types::RepositoryRef;
use crate::runtime::AsyncTask;
use log::{info, warn};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Knobs for one analysis.
#[derive(Debug, Clone)]
pub struct CodeAnalysisConfig {
    /// Language whose files get complexity, MI and lint metrics.
    pub target_language: String,
    pub lint: bool,
    /// Blobs larger than this are counted but not read.
    pub max_file_size: usize,
    pub clone_timeout: Duration,
}

impl Default for CodeAnalysisConfig {
    fn default() -> Self {
        Self {
            target_language: "Python".to_string(),
            lint: true,
            max_file_size: 1_048_576,
            clone_timeout: Duration::from_secs(300),
        }
    }
}

/// Something that can produce a code quality snapshot for a repository.
pub trait CodeQualitySource: Send + Sync {
    fn analyze(
        &self,
        repo: &RepositoryRef,
    ) -> AsyncTask<Result<CodeQualitySnapshot, CodeAnalysisError>>;
}

/// Clones with gix and analyzes the default branch head.
#[derive(Debug, Clone, Default)]
pub struct CodeAnalyzer {
    config: CodeAnalysisConfig,
}

impl CodeAnalyzer {
    #[must_use]
    pub fn new(config: CodeAnalysisConfig) -> Self {
        Self { config }
    }
}

impl CodeQualitySource for CodeAnalyzer {
    fn analyze(
        &self,
        repo: &RepositoryRef,
    ) -> AsyncTask<Result<CodeQualitySnapshot, CodeAnalysisError>> {
        let url = repo.clone_url.clone();
        let name = repo.full_name();
        let config = self.config.clone();

        AsyncTask::spawn_async(async move {
            let temp_dir = TempDir::new()
                .map_err(|e| CodeAnalysisError::SourceUnavailable(format!("temp dir: {e}")))?;
            let interrupt = Arc::new(AtomicBool::new(false));
            let timeout = config.clone_timeout;

            info!("Cloning {name} for code analysis");
            let worker_interrupt = Arc::clone(&interrupt);
            let work = tokio::task::spawn_blocking(move || {
                // The temp dir moves in here so it is removed whenever the
                // clone finishes, even after the caller stopped waiting.
                let result = clone_and_analyze(&url, temp_dir.path(), &config, &worker_interrupt);
                drop(temp_dir);
                result
            });

            match tokio::time::timeout(timeout, work).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(CodeAnalysisError::SourceUnavailable(format!(
                    "analysis task failed: {e}"
                ))),
                Err(_) => {
                    interrupt.store(true, Ordering::Relaxed);
                    warn!("Clone of {name} timed out after {timeout:?}");
                    Err(CodeAnalysisError::SourceUnavailable(format!(
                        "clone timed out after {timeout:?}"
                    )))
                }
            }
        })
    }
}

fn clone_and_analyze(
    url: &str,
    dir: &Path,
    config: &CodeAnalysisConfig,
    interrupt: &AtomicBool,
) -> Result<CodeQualitySnapshot, CodeAnalysisError> {
    let unavailable = |what: &str, e: &dyn std::fmt::Display| {
        CodeAnalysisError::SourceUnavailable(format!("{what}: {e}"))
    };

    let parsed = gix::url::parse(url.into()).map_err(|e| unavailable("invalid clone URL", &e))?;
    let (repo, _outcome) = gix::prepare_clone_bare(parsed, dir.join("repo.git"))
        .map_err(|e| unavailable("clone prepare failed", &e))?
        .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN))
        .fetch_only(gix::progress::Discard, interrupt)
        .map_err(|e| unavailable("clone fetch failed", &e))?;

    let store = GixObjectStore::new(repo);
    let (root, head) = store
        .head_tree()
        .map_err(|e| unavailable("no HEAD commit", &e))?;
    analyze_tree(&store, &root, Some(head.to_string()), config)
}

/// A fixed in-memory tree, for tests and offline analysis.
#[derive(Debug, Clone)]
pub struct MemoryTreeSource {
    store: MemoryObjectStore,
    root: ObjectId,
    head: Option<String>,
    config: CodeAnalysisConfig,
}

impl MemoryTreeSource {
    pub fn new(store: MemoryObjectStore, root: ObjectId, config: CodeAnalysisConfig) -> Self {
        Self {
            store,
            root,
            head: None,
            config,
        }
    }

    /// Convenience over [`MemoryObjectStore::from_files`].
    pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>, config: CodeAnalysisConfig) -> Self
    where
        P: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let (store, root) = MemoryObjectStore::from_files(files);
        Self::new(store, root, config)
    }

    #[must_use]
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = Some(head.into());
        self
    }
}

impl CodeQualitySource for MemoryTreeSource {
    fn analyze(
        &self,
        _repo: &RepositoryRef,
    ) -> AsyncTask<Result<CodeQualitySnapshot, CodeAnalysisError>> {
        let this = self.clone();
        AsyncTask::spawn(move || analyze_tree(&this.store, &this.root, this.head.clone(), &this.config))
    }
}
