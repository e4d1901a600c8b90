//! Function and class blocks recovered from indentation.

use super::lexer::{LogicalLine, Token};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Dotted path through enclosing blocks, e.g. `Parser.parse`.
    pub name: String,
    pub short_name: String,
    pub line: usize,
    /// Index of the header in the logical-line list.
    pub header: usize,
    /// Logical lines nested under the header.
    pub body: Range<usize>,
    /// Parameter names, without `self`/`cls` on methods.
    pub params: Vec<String>,
    pub is_method: bool,
    pub has_docstring: bool,
}

impl Block {
    #[must_use]
    pub fn is_public(&self) -> bool {
        !self.short_name.starts_with('_')
    }
}

/// Position of the `def`/`class` keyword, allowing a leading `async`.
fn header_keyword(line: &LogicalLine) -> Option<(BlockKind, usize)> {
    let mut idx = 0;
    if line.tokens.first().is_some_and(|t| t.is_name("async")) {
        idx = 1;
    }
    match line.tokens.get(idx) {
        Some(t) if t.is_name("def") => Some((BlockKind::Function, idx)),
        Some(t) if t.is_name("class") && idx == 0 => Some((BlockKind::Class, idx)),
        _ => None,
    }
}

/// Tokens between the parentheses following the block name, split on
/// top-level commas.
pub(crate) fn parameter_segments(tokens: &[Token], keyword: usize) -> Vec<&[Token]> {
    let open = keyword + 2;
    if !tokens.get(open).is_some_and(|t| t.is_op("(")) {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = open + 1;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::Op(op) if op == "(" || op == "[" || op == "{" => depth += 1,
            Token::Op(op) if op == ")" || op == "]" || op == "}" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if start < i {
                        segments.push(&tokens[start..i]);
                    }
                    break;
                }
            }
            Token::Op(op) if op == "," && depth == 1 => {
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments
}

fn parameter_name(segment: &[Token]) -> Option<String> {
    segment.iter().find_map(|t| match t {
        Token::Name(n) => Some(n.clone()),
        _ => None,
    })
}

/// All function and class blocks, in source order.
#[must_use]
pub fn blocks(lines: &[LogicalLine]) -> Vec<Block> {
    let mut out = Vec::new();
    // Enclosing blocks: (kind, name, body end)
    let mut stack: Vec<(BlockKind, String, usize)> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        while stack.last().is_some_and(|(_, _, end)| *end <= i) {
            stack.pop();
        }
        let Some((kind, keyword)) = header_keyword(line) else {
            continue;
        };
        let Some(Token::Name(short_name)) = line.tokens.get(keyword + 1) else {
            continue;
        };

        let mut end = i + 1;
        while end < lines.len() && lines[end].level > line.level {
            end += 1;
        }

        let is_method = kind == BlockKind::Function
            && stack.last().is_some_and(|(k, _, _)| *k == BlockKind::Class);
        let name = match stack.last() {
            Some((_, parent, _)) => format!("{parent}.{short_name}"),
            None => short_name.clone(),
        };

        let params = if kind == BlockKind::Function {
            let mut params: Vec<String> = parameter_segments(&line.tokens, keyword)
                .into_iter()
                .filter_map(parameter_name)
                .collect();
            if is_method && params.first().is_some_and(|p| p == "self" || p == "cls") {
                params.remove(0);
            }
            params
        } else {
            Vec::new()
        };

        let has_docstring = lines
            .get(i + 1)
            .filter(|_| end > i + 1)
            .is_some_and(LogicalLine::is_string_statement);

        out.push(Block {
            kind,
            name: name.clone(),
            short_name: short_name.clone(),
            line: line.line,
            header: i,
            body: i + 1..end,
            params,
            is_method,
            has_docstring,
        });
        stack.push((kind, name, end));
    }
    out
}
