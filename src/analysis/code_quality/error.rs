use crate::runtime::TaskAborted;
use thiserror::Error;

/// Failures of the static analyzer as a whole. Per-file problems are
/// reported as [`FileAnalysisError`](super::types::FileAnalysisError) data.
#[derive(Debug, Error)]
pub enum CodeAnalysisError {
    /// Clone, fetch or open failed, or timed out. The run continues
    /// without a snapshot.
    #[error("source tree unavailable: {0}")]
    SourceUnavailable(String),

    /// The object database was readable but a tree in it was not.
    #[error("tree traversal failed: {0}")]
    Traversal(String),
}

impl From<TaskAborted> for CodeAnalysisError {
    fn from(_: TaskAborted) -> Self {
        CodeAnalysisError::SourceUnavailable("analysis task was aborted".to_string())
    }
}
