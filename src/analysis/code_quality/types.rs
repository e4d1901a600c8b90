//! Code quality snapshot types

use crate::analysis::types::QualityScore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of analyzing one source tree. Replaces any previous snapshot for
/// the repository wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CodeQualitySnapshot {
    /// The tree holds no file in the analyzed language.
    Empty(EmptySnapshot),
    Analyzed(Box<CodeQualityReport>),
}

impl CodeQualitySnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, CodeQualitySnapshot::Empty(_))
    }

    #[must_use]
    pub fn report(&self) -> Option<&CodeQualityReport> {
        match self {
            CodeQualitySnapshot::Analyzed(report) => Some(report),
            CodeQualitySnapshot::Empty(_) => None,
        }
    }

    #[must_use]
    pub fn head_commit(&self) -> Option<&str> {
        match self {
            CodeQualitySnapshot::Empty(e) => e.head_commit.as_deref(),
            CodeQualitySnapshot::Analyzed(r) => r.head_commit.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmptySnapshot {
    pub language: String,
    pub head_commit: Option<String>,
    /// Repository content counts are still reported for empty snapshots.
    pub content: ContentSummary,
}

/// Counts over every non-ignored file in the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentSummary {
    pub total_files: usize,
    pub total_lines: u64,
    pub languages: BTreeMap<String, LanguageStats>,
    /// Keyed by lowercase extension including the dot, or `no_extension`.
    pub file_types: BTreeMap<String, usize>,
    pub largest_files: Vec<LargestFile>,
    pub test_files: usize,
}

impl ContentSummary {
    /// Share of lines per language, in percent.
    #[must_use]
    pub fn language_percentages(&self) -> BTreeMap<String, f64> {
        let total: u64 = self.languages.values().map(|s| s.lines).sum();
        if total == 0 {
            return BTreeMap::new();
        }
        self.languages
            .iter()
            .map(|(lang, stats)| (lang.clone(), stats.lines as f64 * 100.0 / total as f64))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageStats {
    pub files: usize,
    pub lines: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LargestFile {
    pub path: String,
    pub lines: u64,
    pub size: u64,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeQualityReport {
    pub language: String,
    pub head_commit: Option<String>,
    pub content: ContentSummary,
    pub files: Vec<FileMetrics>,
    pub failures: Vec<FileAnalysisError>,
    pub total_functions: usize,
    /// Functions with complexity above [`HIGH_COMPLEXITY`].
    pub high_complexity_functions: usize,
    /// `None` when every target-language file failed analysis.
    pub averages: Option<QualityAverages>,
    pub lint: Option<LintSummary>,
    pub insights: Option<CodeInsights>,
}

impl CodeQualityReport {
    /// 0-10 blend of maintainability, complexity and lint.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.averages.as_ref().map(|a| a.score)
    }
}

/// Averages over the files that were analyzed successfully.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QualityAverages {
    pub avg_complexity: f64,
    pub complexity_grade: Grade,
    pub avg_maintainability: f64,
    pub maintainability_grade: Grade,
    pub score: f64,
}

pub const HIGH_COMPLEXITY: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileMetrics {
    pub path: String,
    pub functions: Vec<FunctionComplexity>,
    pub maintainability: f64,
    pub sloc: u64,
    pub comment_lines: u64,
    pub halstead_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionComplexity {
    /// `Class.method` for methods.
    pub name: String,
    pub line: usize,
    pub complexity: u32,
}

/// A file that could not be analyzed. Data, not an error path: it is listed
/// in the report and left out of every average.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAnalysisError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LintSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub conventions: usize,
    pub refactors: usize,
    pub score: f64,
    pub messages: Vec<LintMessage>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LintCategory {
    Error,
    Warning,
    Convention,
    Refactor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LintMessage {
    pub path: String,
    pub line: usize,
    pub category: LintCategory,
    pub rule: String,
    pub message: String,
}

/// Narrative LLM take on the metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeInsights {
    pub summary: String,
    pub suggestions: Vec<String>,
    pub best_practices: QualityScore,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Letter for an average cyclomatic complexity.
    #[must_use]
    pub fn for_complexity(cc: f64) -> Grade {
        match cc {
            c if c <= 5.0 => Grade::A,
            c if c <= 10.0 => Grade::B,
            c if c <= 20.0 => Grade::C,
            c if c <= 30.0 => Grade::D,
            c if c <= 40.0 => Grade::E,
            _ => Grade::F,
        }
    }

    /// Letter for a maintainability index.
    #[must_use]
    pub fn for_maintainability(mi: f64) -> Grade {
        match mi {
            m if m >= 20.0 => Grade::A,
            m if m >= 10.0 => Grade::B,
            m if m >= 0.0 => Grade::C,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}
