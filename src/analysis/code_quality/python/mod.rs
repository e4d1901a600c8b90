//! Python source metrics.

pub mod blocks;
pub mod lexer;
pub mod lint;
pub mod metrics;

use crate::analysis::code_quality::types::{FileMetrics, FunctionComplexity, LintMessage};
use blocks::BlockKind;
use lexer::LexError;
use metrics::RawCounts;

/// Everything measured for one Python file.
#[derive(Debug, Clone, PartialEq)]
pub struct PythonFile {
    pub metrics: FileMetrics,
    /// Decision points plus one per function, the MI complexity term.
    pub total_complexity: u32,
    pub lint: Vec<LintMessage>,
}

/// Measure one file. `lint` toggles the rule checks.
pub fn analyze_source(path: &str, source: &str, lint: bool) -> Result<PythonFile, LexError> {
    let lexed = lexer::lex(source)?;
    let blocks = blocks::blocks(&lexed.lines);

    let mut functions = Vec::new();
    let mut complexities = Vec::new();
    for block in blocks.iter().filter(|b| b.kind == BlockKind::Function) {
        let complexity = metrics::function_complexity(&lexed.lines, block, &blocks);
        complexities.push((block.header, complexity));
        functions.push(FunctionComplexity {
            name: block.name.clone(),
            line: block.line,
            complexity,
        });
    }

    let raw = RawCounts::from_lexed(&lexed);
    let volume = metrics::halstead(&lexed.lines).volume();
    let total_complexity = metrics::total_complexity(&lexed.lines, &blocks);
    let maintainability = metrics::maintainability_index(
        volume,
        f64::from(total_complexity),
        raw.lloc as f64,
        raw.comment_percent(),
    );

    let lint = if lint {
        lint::lint_file(path, source, &lexed.lines, &blocks, &complexities)
    } else {
        Vec::new()
    };

    Ok(PythonFile {
        metrics: FileMetrics {
            path: path.to_string(),
            functions,
            maintainability,
            sloc: raw.sloc,
            comment_lines: raw.comments + raw.docstring_lines,
            halstead_volume: volume,
        },
        total_complexity,
        lint,
    })
}
