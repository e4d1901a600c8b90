//! Qualitative scoring of commit messages, pull requests and issues.

pub mod backend;
pub mod prompts;
pub mod scorer;

pub use backend::{CompletionBackend, LlmError, OpenAiBackend, Prompt};
pub use prompts::{ArtifactKind, InsightMetrics};
pub use scorer::{QualityScorer, ReplyError, parse_score_reply};
