//! Prompt templates. Only the reply contract (`{"score", "feedback"}`) is
//! load-bearing; the wording can change freely.

use crate::analysis::code_quality::types::CodeQualityReport;
use crate::llm::backend::Prompt;

const NO_DESCRIPTION: &str = "(No description provided)";

const REPLY_CONTRACT: &str = r#"Respond in JSON format with:
{"score": <number 0-10>, "feedback": "<brief explanation of the score>"}"#;

const REPLY_CONTRACT_BULLETS: &str = r#"Respond in JSON format with:
{"score": <number 0-10>, "feedback": "<brief explanation of the score in bullet points>"}"#;

/// What kind of text is being rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    CommitMessage,
    PullRequestDescription,
    IssueDescription,
}

impl ArtifactKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::CommitMessage => "commit message",
            ArtifactKind::PullRequestDescription => "pull request description",
            ArtifactKind::IssueDescription => "issue description",
        }
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        NO_DESCRIPTION
    } else {
        text
    }
}

#[must_use]
pub fn commit_message(message: &str) -> Prompt {
    Prompt {
        system: None,
        user: format!(
            "Analyze this Git commit message and rate its quality from 0-10.\n\n\
             Consider:\n\
             - Clarity: Is it clear what was changed?\n\
             - Context: Does it explain why the change was made?\n\
             - Format: Does it follow conventional commit format (optional but good)?\n\
             - Completeness: Does it provide enough information?\n\n\
             Commit message:\n{}\n\n{REPLY_CONTRACT}",
            or_placeholder(message)
        ),
        json_mode: true,
    }
}

#[must_use]
pub fn pull_request(title: &str, body: &str) -> Prompt {
    Prompt {
        system: None,
        user: format!(
            "Analyze this Pull Request and rate its description quality from 0-10.\n\n\
             Consider:\n\
             - Clarity: Is it clear what changes are being made?\n\
             - Context: Does it explain the purpose and reasoning?\n\
             - Completeness: Does it include testing information, breaking changes, etc.?\n\
             - Structure: Is it well-organized and easy to understand?\n\n\
             PR Title: {title}\n\nPR Description:\n{}\n\n{REPLY_CONTRACT_BULLETS}",
            or_placeholder(body)
        ),
        json_mode: true,
    }
}

#[must_use]
pub fn issue(title: &str, body: &str) -> Prompt {
    Prompt {
        system: None,
        user: format!(
            "Analyze this GitHub Issue and rate its description quality from 0-10.\n\n\
             Consider:\n\
             - Clarity: Is the problem clearly stated?\n\
             - Reproducibility: Can someone reproduce the issue from this description?\n\
             - Completeness: Does it include relevant details, steps, expected vs actual behavior?\n\
             - Actionability: Is it clear what needs to be done?\n\n\
             Issue Title: {title}\n\nIssue Description:\n{}\n\n{REPLY_CONTRACT_BULLETS}",
            or_placeholder(body)
        ),
        json_mode: true,
    }
}

/// Prompt for a bare text of the given kind (no separate title).
#[must_use]
pub fn for_kind(text: &str, kind: ArtifactKind) -> Prompt {
    match kind {
        ArtifactKind::CommitMessage => commit_message(text),
        ArtifactKind::PullRequestDescription => pull_request("", text),
        ArtifactKind::IssueDescription => issue("", text),
    }
}

/// Metrics summarised for the code insight prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightMetrics {
    pub files: usize,
    pub avg_complexity: f64,
    pub high_complexity_functions: usize,
    pub avg_maintainability: f64,
    pub language: &'static str,
}

impl InsightMetrics {
    /// `None` when the report has no analyzed file to talk about.
    #[must_use]
    pub fn from_report(report: &CodeQualityReport) -> Option<Self> {
        let averages = report.averages.as_ref()?;
        Some(Self {
            files: report.files.len(),
            avg_complexity: averages.avg_complexity,
            high_complexity_functions: report.high_complexity_functions,
            avg_maintainability: averages.avg_maintainability,
            language: "Python",
        })
    }
}

#[must_use]
pub fn code_insights(m: &InsightMetrics) -> Prompt {
    Prompt {
        system: Some("You are a code quality expert analyzing repository metrics.".to_string()),
        user: format!(
            "Analyze the following code quality metrics for a {lang} repository:\n\n\
             - Number of {lang} files: {files}\n\
             - Average cyclomatic complexity: {cc:.2}\n\
             - High complexity functions (>10): {high}\n\
             - Average maintainability index: {mi:.2}\n\n\
             Provide:\n\
             1. A brief summary of overall code quality (2-3 sentences)\n\
             2. Top 3 specific improvement suggestions\n\
             3. A best practices score from 0-10\n\n\
             Format your response as JSON:\n\
             {{\"summary\": \"...\", \"suggestions\": [\"...\", \"...\", \"...\"], \"score\": 7.5}}",
            lang = m.language,
            files = m.files,
            cc = m.avg_complexity,
            high = m.high_complexity_functions,
            mi = m.avg_maintainability,
        ),
        json_mode: true,
    }
}
