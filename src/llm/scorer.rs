//! LLM-backed quality rating with a fixed fallback.
//!
//! Scoring never fails: anything that goes wrong between the prompt and a
//! usable `{score, feedback}` pair yields [`QualityScore::fallback`].

use crate::analysis::code_quality::types::CodeInsights;
use crate::analysis::types::QualityScore;
use crate::llm::backend::{CompletionBackend, LlmError, Prompt};
use crate::llm::prompts::{self, ArtifactKind, InsightMetrics};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Why a completion could not be turned into a score.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("no JSON object in reply")]
    NoJson,
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("reply has no usable `{0}` field")]
    MissingField(&'static str),
    #[error("`score` is not a finite number")]
    NotFinite,
}

/// Rates natural-language artifacts through a [`CompletionBackend`].
#[derive(Clone)]
pub struct QualityScorer {
    backend: Arc<dyn CompletionBackend>,
}

impl QualityScorer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Rate a single text of the given kind.
    pub async fn score(&self, text: &str, kind: ArtifactKind) -> QualityScore {
        self.rate(prompts::for_kind(text, kind), kind).await
    }

    /// Rate a titled artifact. Commit messages ignore the split and are
    /// scored as `title` followed by `body`.
    pub async fn score_titled(&self, title: &str, body: &str, kind: ArtifactKind) -> QualityScore {
        let prompt = match kind {
            ArtifactKind::PullRequestDescription => prompts::pull_request(title, body),
            ArtifactKind::IssueDescription => prompts::issue(title, body),
            ArtifactKind::CommitMessage => {
                let message = if body.is_empty() {
                    title.to_string()
                } else {
                    format!("{title}\n\n{body}")
                };
                prompts::commit_message(&message)
            }
        };
        self.rate(prompt, kind).await
    }

    async fn rate(&self, prompt: Prompt, kind: ArtifactKind) -> QualityScore {
        let reply: Result<String, LlmError> = self.backend.complete(&prompt).join().await;
        match reply {
            Ok(text) => match parse_score_reply(&text) {
                Ok(score) => score,
                Err(e) => {
                    warn!("Unusable {} rating, using fallback: {e}", kind.label());
                    debug!("Raw reply: {text}");
                    QualityScore::fallback(format!("Error during analysis: {e}"))
                }
            },
            Err(e) => {
                warn!("Rating {} failed, using fallback: {e}", kind.label());
                QualityScore::fallback(format!("Error during analysis: {e}"))
            }
        }
    }

    /// Narrative summary and best-practice score for a code quality report.
    pub async fn code_insights(&self, metrics: &InsightMetrics) -> CodeInsights {
        let reply: Result<String, LlmError> = self
            .backend
            .complete(&prompts::code_insights(metrics))
            .join()
            .await;
        let parsed = match reply {
            Ok(text) => parse_insights_reply(&text),
            Err(e) => Err(e.to_string()),
        };
        parsed.unwrap_or_else(|reason| {
            warn!("Code insights unavailable: {reason}");
            CodeInsights {
                summary: format!("Unable to generate insights: {reason}"),
                suggestions: Vec::new(),
                best_practices: QualityScore::fallback(reason),
            }
        })
    }
}

impl std::fmt::Debug for QualityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityScorer").finish_non_exhaustive()
    }
}

/// Locate the JSON object in a completion: a ```json fence, any ``` fence,
/// or the outermost braces of the raw text.
fn extract_json(text: &str) -> Option<&str> {
    let fenced = if let Some((_, rest)) = text.split_once("```json") {
        rest.split("```").next()
    } else if let Some((_, rest)) = text.split_once("```") {
        rest.split("```").next()
    } else {
        None
    };
    let candidate = fenced.unwrap_or(text);
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    (start < end).then(|| &candidate[start..=end])
}

fn parse_object(text: &str) -> Result<serde_json::Map<String, Value>, ReplyError> {
    let json = extract_json(text).ok_or(ReplyError::NoJson)?;
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ReplyError::NoJson),
        Err(e) => Err(ReplyError::InvalidJson(e.to_string())),
    }
}

fn number(value: Option<&Value>) -> Result<f64, ReplyError> {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or(ReplyError::MissingField("score"))?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ReplyError::NotFinite)
    }
}

fn text_or_lines(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Parse a `{score, feedback}` reply. `feedback` given as a list is joined
/// with newlines; the score is clamped to the 0-10 range.
pub fn parse_score_reply(text: &str) -> Result<QualityScore, ReplyError> {
    let map = parse_object(text)?;
    let score = number(map.get("score"))?;
    let feedback = map
        .get("feedback")
        .filter(|v| !v.is_null())
        .map(text_or_lines)
        .ok_or(ReplyError::MissingField("feedback"))?;
    Ok(QualityScore::new(score, feedback))
}

fn parse_insights_reply(text: &str) -> Result<CodeInsights, String> {
    let map = parse_object(text).map_err(|e| e.to_string())?;
    let summary = map
        .get("summary")
        .map(text_or_lines)
        .unwrap_or_default();
    let suggestions = match map.get("suggestions") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    };
    let best_practices = match number(map.get("score")) {
        Ok(score) => QualityScore::new(score, summary.clone()),
        Err(e) => QualityScore::fallback(e.to_string()),
    };
    Ok(CodeInsights {
        summary,
        suggestions,
        best_practices,
    })
}
