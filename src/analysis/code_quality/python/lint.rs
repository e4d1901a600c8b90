//! Lightweight lint rules over tokens and physical lines.

use super::blocks::{Block, BlockKind, parameter_segments};
use super::lexer::{LogicalLine, Token};
use crate::analysis::code_quality::types::{LintCategory, LintMessage};

pub const MAX_LINE_LENGTH: usize = 100;
pub const MAX_ARGUMENTS: usize = 5;
pub const MAX_COMPLEXITY: u32 = 12;

struct Sink<'a> {
    path: &'a str,
    messages: Vec<LintMessage>,
}

impl Sink<'_> {
    fn push(&mut self, line: usize, category: LintCategory, rule: &str, message: String) {
        self.messages.push(LintMessage {
            path: self.path.to_string(),
            line,
            category,
            rule: rule.to_string(),
            message,
        });
    }
}

fn inside_function(idx: usize, blocks: &[Block]) -> bool {
    blocks
        .iter()
        .any(|b| b.kind == BlockKind::Function && (b.body.contains(&idx) || b.header == idx))
}

fn has_mutable_default(segment: &[Token]) -> bool {
    segment.windows(2).any(|w| {
        w[0].is_op("=")
            && (w[1].is_op("[")
                || w[1].is_op("{")
                || w[1].is_name("list")
                || w[1].is_name("dict")
                || w[1].is_name("set"))
    })
}

/// Run every rule over one file. `complexities` pairs with the function
/// blocks of `blocks`, in order.
#[must_use]
pub fn lint_file(
    path: &str,
    source: &str,
    lines: &[LogicalLine],
    blocks: &[Block],
    complexities: &[(usize, u32)],
) -> Vec<LintMessage> {
    let mut sink = Sink {
        path,
        messages: Vec::new(),
    };

    for (n, text) in source.lines().enumerate() {
        let line = n + 1;
        let width = text.chars().count();
        if width > MAX_LINE_LENGTH {
            sink.push(
                line,
                LintCategory::Convention,
                "line-too-long",
                format!("Line too long ({width}/{MAX_LINE_LENGTH})"),
            );
        }
        if text != text.trim_end() {
            sink.push(
                line,
                LintCategory::Convention,
                "trailing-whitespace",
                "Trailing whitespace".to_string(),
            );
        }
    }

    for (idx, logical) in lines.iter().enumerate() {
        let first = logical.first_name();
        if matches!(first, Some("return") | Some("yield")) && !inside_function(idx, blocks) {
            let keyword = first.unwrap_or_default();
            sink.push(
                logical.line,
                LintCategory::Error,
                if keyword == "return" {
                    "return-outside-function"
                } else {
                    "yield-outside-function"
                },
                format!("'{keyword}' outside function"),
            );
        }
        if first == Some("except") && logical.tokens.get(1).is_some_and(|t| t.is_op(":")) {
            sink.push(
                logical.line,
                LintCategory::Warning,
                "bare-except",
                "No exception type(s) specified".to_string(),
            );
        }
        if logical.tokens.last().is_some_and(|t| t.is_op(";")) {
            sink.push(
                logical.line,
                LintCategory::Warning,
                "unnecessary-semicolon",
                "Unnecessary semicolon".to_string(),
            );
        }
        for pair in logical.tokens.windows(2) {
            if (pair[0].is_op("==") || pair[0].is_op("!=")) && pair[1].is_name("None") {
                sink.push(
                    logical.line,
                    LintCategory::Convention,
                    "singleton-comparison",
                    "Comparison to None should use 'is' or 'is not'".to_string(),
                );
            }
        }
    }

    for block in blocks {
        let what = match block.kind {
            BlockKind::Function if block.is_method => "method",
            BlockKind::Function => "function",
            BlockKind::Class => "class",
        };
        if block.is_public() && !block.has_docstring {
            sink.push(
                block.line,
                LintCategory::Convention,
                "missing-docstring",
                format!("Missing {what} docstring for '{}'", block.name),
            );
        }
        if block.kind != BlockKind::Function {
            continue;
        }
        let header = &lines[block.header];
        let keyword = usize::from(header.tokens.first().is_some_and(|t| t.is_name("async")));
        if parameter_segments(&header.tokens, keyword)
            .into_iter()
            .any(has_mutable_default)
        {
            sink.push(
                block.line,
                LintCategory::Warning,
                "dangerous-default-value",
                format!("Mutable default argument in '{}'", block.name),
            );
        }
        if block.params.len() > MAX_ARGUMENTS {
            sink.push(
                block.line,
                LintCategory::Refactor,
                "too-many-arguments",
                format!(
                    "Too many arguments ({}/{MAX_ARGUMENTS}) in '{}'",
                    block.params.len(),
                    block.name
                ),
            );
        }
    }

    for &(header, complexity) in complexities {
        if complexity > MAX_COMPLEXITY {
            sink.push(
                lines[header].line,
                LintCategory::Refactor,
                "too-complex",
                format!("Cyclomatic complexity {complexity} exceeds {MAX_COMPLEXITY}"),
            );
        }
    }

    sink.messages
}

/// `10 - (E + 0.5 W + 0.25 C + 0.25 R) / files`, clamped to 0-10. Ten for an
/// empty file set.
#[must_use]
pub fn lint_score(
    files: usize,
    errors: usize,
    warnings: usize,
    conventions: usize,
    refactors: usize,
) -> f64 {
    if files == 0 {
        return 10.0;
    }
    let weighted =
        errors as f64 + 0.5 * warnings as f64 + 0.25 * conventions as f64 + 0.25 * refactors as f64;
    (10.0 - weighted / files as f64).clamp(0.0, 10.0)
}
