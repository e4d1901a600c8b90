//! Cyclomatic complexity, Halstead volume and maintainability index.

use super::blocks::{Block, BlockKind};
use super::lexer::{Lexed, LogicalLine, Token};
use std::collections::HashSet;

const DECISION_KEYWORDS: &[&str] = &[
    "if", "elif", "for", "while", "except", "with", "assert", "and", "or",
];

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

const KEYWORD_OPERATORS: &[&str] = &["and", "or", "not", "in", "is"];

/// Punctuation that structures code rather than computing anything.
const NON_OPERATORS: &[&str] = &["(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "->", "="];

/// Decision points on one logical line.
#[must_use]
pub fn decision_points(line: &LogicalLine) -> u32 {
    let keywords = line
        .tokens
        .iter()
        .filter(|t| matches!(t, Token::Name(n) if DECISION_KEYWORDS.contains(&n.as_str())))
        .count() as u32;
    // `case` is a soft keyword: only a `case ...:` clause counts.
    let case_clause = line.first_name() == Some("case")
        && line.tokens.len() > 2
        && line.tokens.last().is_some_and(|t| t.is_op(":"));
    keywords + u32::from(case_clause)
}

/// Complexity of a function: 1 plus the decision points of its header and
/// body, not counting nested functions or classes.
#[must_use]
pub fn function_complexity(lines: &[LogicalLine], block: &Block, all: &[Block]) -> u32 {
    let nested: Vec<&Block> = all
        .iter()
        .filter(|b| b.header > block.header && b.header < block.body.end)
        .collect();
    let mut complexity = 1 + decision_points(&lines[block.header]);
    for idx in block.body.clone() {
        if nested
            .iter()
            .any(|b| idx == b.header || b.body.contains(&idx))
        {
            continue;
        }
        complexity += decision_points(&lines[idx]);
    }
    complexity
}

/// Sum of all decision points in the file plus one per function, used as
/// the complexity term of the maintainability index.
#[must_use]
pub fn total_complexity(lines: &[LogicalLine], blocks: &[Block]) -> u32 {
    let decisions: u32 = lines.iter().map(decision_points).sum();
    let functions = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Function)
        .count() as u32;
    decisions + functions
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Halstead {
    pub distinct_operators: usize,
    pub distinct_operands: usize,
    pub total_operators: usize,
    pub total_operands: usize,
}

impl Halstead {
    #[must_use]
    pub fn vocabulary(&self) -> usize {
        self.distinct_operators + self.distinct_operands
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.total_operators + self.total_operands
    }

    /// `N * log2(n)`; zero for an empty or single-symbol vocabulary.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let n = self.vocabulary();
        if n < 2 {
            return 0.0;
        }
        self.length() as f64 * (n as f64).log2()
    }
}

#[must_use]
pub fn halstead(lines: &[LogicalLine]) -> Halstead {
    let mut operators: HashSet<String> = HashSet::new();
    let mut operands: HashSet<String> = HashSet::new();
    let mut h = Halstead::default();

    for token in lines.iter().flat_map(|l| l.tokens.iter()) {
        match token {
            Token::Op(op) if !NON_OPERATORS.contains(&op.as_str()) => {
                h.total_operators += 1;
                operators.insert(op.clone());
            }
            Token::Name(n) if KEYWORD_OPERATORS.contains(&n.as_str()) => {
                h.total_operators += 1;
                operators.insert(n.clone());
            }
            Token::Name(n) if !KEYWORDS.contains(&n.as_str()) => {
                h.total_operands += 1;
                operands.insert(n.clone());
            }
            Token::Number(n) => {
                h.total_operands += 1;
                operands.insert(n.clone());
            }
            Token::Str { .. } => {
                h.total_operands += 1;
                operands.insert("\"str\"".to_string());
            }
            _ => {}
        }
    }
    h.distinct_operators = operators.len();
    h.distinct_operands = operands.len();
    h
}

/// Line counts of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCounts {
    /// Physical lines of code: not blank, not comment-only, not docstring.
    pub sloc: u64,
    /// Logical lines (statements).
    pub lloc: u64,
    pub comments: u64,
    /// Lines taken by standalone string statements (docstrings).
    pub docstring_lines: u64,
}

impl RawCounts {
    #[must_use]
    pub fn from_lexed(lexed: &Lexed) -> Self {
        let docstring_lines: u64 = lexed
            .lines
            .iter()
            .filter(|l| l.is_string_statement())
            .flat_map(|l| l.tokens.iter())
            .map(|t| match t {
                Token::Str { lines } => *lines as u64,
                _ => 0,
            })
            .sum();
        let non_code = (lexed.blank_lines + lexed.comment_only_lines) as u64 + docstring_lines;
        Self {
            sloc: (lexed.physical_lines as u64).saturating_sub(non_code),
            lloc: lexed.lines.len() as u64,
            comments: lexed.comments as u64,
            docstring_lines,
        }
    }

    /// Comment and docstring lines relative to source lines, in percent.
    #[must_use]
    pub fn comment_percent(&self) -> f64 {
        if self.sloc == 0 {
            return 0.0;
        }
        (self.comments + self.docstring_lines) as f64 * 100.0 / self.sloc as f64
    }
}

/// Maintainability index on a 0-100 scale.
///
/// `volume` is the Halstead volume, `complexity` the file's total cyclomatic
/// complexity, `lloc` its logical line count and `comment_percent` the
/// comment share in percent.
#[must_use]
pub fn maintainability_index(volume: f64, complexity: f64, lloc: f64, comment_percent: f64) -> f64 {
    if volume <= 0.0 || lloc <= 0.0 {
        return 100.0;
    }
    let comments = (2.46 * comment_percent.to_radians()).sqrt().sin();
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * complexity - 16.2 * lloc.ln() + 50.0 * comments;
    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}
