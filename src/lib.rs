//! `repo_insights` - contributor quality metrics for GitHub repositories
//!
//! This library fetches a repository's commits, pull requests, issues and
//! comments through octocrab, rates their natural-language content with an
//! LLM, measures the source tree straight out of a bare clone, and folds
//! everything into per-contributor aggregates.

// Module declarations
pub mod analysis;
pub mod github;
pub mod llm;
pub mod runtime;
pub mod store;

// Re-export runtime types
pub use runtime::{AsyncStream, AsyncTask, StreamSender};

// Re-export GitHub client types
pub use github::{GitHubClient, GitHubClientBuilder, SourceProvider, parse_repo_url};

// Re-export error types
pub use analysis::PipelineError;
pub use github::{GitHubError, GitHubResult};

// Re-export pipeline types
pub use analysis::code_quality::{CodeAnalyzer, CodeQualitySnapshot, CodeQualitySource};
pub use analysis::{AnalysisConfig, AnalysisSummary, ContributorAggregate, Pipeline};

// Re-export scoring and storage
pub use llm::{CompletionBackend, OpenAiBackend, QualityScorer};
pub use store::{JsonFileStore, MemoryStore, PersistenceGateway};
