//! Python tokenizer producing logical lines.
//!
//! Enough of the language to measure it: names, numbers, strings (all prefix
//! and quoting forms), operators, bracket nesting, implicit and explicit line
//! joining, comments and indentation. It does not build an AST.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string starting on line {0}")]
    UnterminatedString(usize),
    #[error("unmatched '{close}' on line {line}")]
    UnmatchedClose { close: char, line: usize },
    #[error("'{open}' opened on line {line} is never closed")]
    UnclosedBracket { open: char, line: usize },
    #[error("unindent does not match any outer indentation level on line {0}")]
    InconsistentDedent(usize),
    #[error("unexpected character {ch:?} on line {line}")]
    UnexpectedChar { ch: char, line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Name(String),
    Number(String),
    /// A string literal; `lines` is the number of physical lines it spans.
    Str { lines: usize },
    Op(String),
}

impl Token {
    #[must_use]
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Token::Name(n) if n == name)
    }

    #[must_use]
    pub fn is_op(&self, op: &str) -> bool {
        matches!(self, Token::Op(o) if o == op)
    }
}

/// One logical line: a statement or compound-statement header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based physical line the statement starts on.
    pub line: usize,
    /// Nesting depth derived from the indentation stack.
    pub level: usize,
    pub tokens: Vec<Token>,
}

impl LogicalLine {
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        match self.tokens.first() {
            Some(Token::Name(n)) => Some(n),
            _ => None,
        }
    }

    /// A statement consisting of a single string literal.
    #[must_use]
    pub fn is_string_statement(&self) -> bool {
        !self.tokens.is_empty() && self.tokens.iter().all(|t| matches!(t, Token::Str { .. }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub lines: Vec<LogicalLine>,
    pub physical_lines: usize,
    pub blank_lines: usize,
    /// Lines holding only a comment.
    pub comment_only_lines: usize,
    /// Every comment, standalone or trailing.
    pub comments: usize,
}

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "<<", ">>", "->", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "@=", ":=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>=.,:;!";

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "b" | "u" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
    line: usize,
}

impl Lexer<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(k, c)| self.peek(k) == Some(c))
    }

    /// Consume a string body starting at the opening quote.
    fn string(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let quote = self.chars[self.pos];
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        loop {
            let Some(c) = self.peek(0) else {
                return Err(LexError::UnterminatedString(start_line));
            };
            match c {
                '\\' => {
                    if self.peek(1) == Some('\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                '\n' if !triple => return Err(LexError::UnterminatedString(start_line)),
                '\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c == quote => {
                    if !triple {
                        self.pos += 1;
                        break;
                    }
                    if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                        self.pos += 3;
                        break;
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Ok(Token::Str {
            lines: self.line - start_line + 1,
        })
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn number(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            let exponent_sign = (c == '+' || c == '-')
                && self.pos > start
                && matches!(self.chars[self.pos - 1], 'e' | 'E')
                && !self.chars[start..self.pos].iter().any(|c| matches!(c, 'x' | 'X'));
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn operator(&mut self) -> Option<String> {
        for op in THREE_CHAR_OPS.iter().chain(TWO_CHAR_OPS) {
            if self.starts_with(op) {
                self.pos += op.len();
                return Some((*op).to_string());
            }
        }
        let c = self.peek(0)?;
        if ONE_CHAR_OPS.contains(c) {
            self.pos += 1;
            return Some(c.to_string());
        }
        None
    }

    fn skip_to_eol(&mut self) {
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }
}

/// Tokenize `source` into logical lines.
pub fn lex(source: &str) -> Result<Lexed, LexError> {
    let chars: Vec<char> = source.chars().collect();
    let mut lx = Lexer {
        chars: &chars,
        pos: 0,
        line: 1,
    };
    let mut out = Lexed {
        physical_lines: source.lines().count(),
        ..Lexed::default()
    };
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut current: Option<LogicalLine> = None;

    loop {
        // Start of a logical line: measure indentation, skip blank and
        // comment-only lines.
        if current.is_none() {
            let mut col = 0usize;
            while let Some(c) = lx.peek(0) {
                match c {
                    ' ' => col += 1,
                    '\t' => col = (col / 8 + 1) * 8,
                    '\x0c' => col = 0,
                    '\r' => {}
                    _ => break,
                }
                lx.pos += 1;
            }
            match lx.peek(0) {
                None => break,
                Some('\n') => {
                    out.blank_lines += 1;
                    lx.pos += 1;
                    lx.line += 1;
                    continue;
                }
                Some('#') => {
                    out.comments += 1;
                    out.comment_only_lines += 1;
                    lx.skip_to_eol();
                    if lx.peek(0) == Some('\n') {
                        lx.pos += 1;
                        lx.line += 1;
                    }
                    continue;
                }
                Some(_) => {}
            }

            let top = indents.last().copied().unwrap_or(0);
            if col > top {
                indents.push(col);
            } else if col < top {
                while indents.last().is_some_and(|&i| i > col) {
                    indents.pop();
                }
                if indents.last() != Some(&col) {
                    return Err(LexError::InconsistentDedent(lx.line));
                }
            }
            current = Some(LogicalLine {
                line: lx.line,
                level: indents.len() - 1,
                tokens: Vec::new(),
            });
        }

        let Some(c) = lx.peek(0) else { break };
        let token = match c {
            ' ' | '\t' | '\x0c' | '\r' => {
                lx.pos += 1;
                None
            }
            '\n' => {
                lx.pos += 1;
                lx.line += 1;
                if brackets.is_empty() {
                    out.lines.extend(current.take().filter(|l| !l.tokens.is_empty()));
                }
                None
            }
            '#' => {
                out.comments += 1;
                lx.skip_to_eol();
                None
            }
            '\\' if matches!(lx.peek(1), Some('\n') | Some('\r')) => {
                lx.pos += 1;
                if lx.peek(0) == Some('\r') {
                    lx.pos += 1;
                }
                if lx.peek(0) == Some('\n') {
                    lx.pos += 1;
                }
                lx.line += 1;
                None
            }
            '"' | '\'' => Some(lx.string()?),
            c if c.is_ascii_digit() => Some(Token::Number(lx.number())),
            '.' if lx.peek(1).is_some_and(|n| n.is_ascii_digit()) => {
                Some(Token::Number(lx.number()))
            }
            c if c.is_alphabetic() || c == '_' => {
                let name = lx.name();
                if is_string_prefix(&name) && matches!(lx.peek(0), Some('"') | Some('\'')) {
                    Some(lx.string()?)
                } else {
                    Some(Token::Name(name))
                }
            }
            '(' | '[' | '{' => {
                brackets.push((c, lx.line));
                lx.pos += 1;
                Some(Token::Op(c.to_string()))
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(LexError::UnmatchedClose {
                            close: c,
                            line: lx.line,
                        });
                    }
                }
                lx.pos += 1;
                Some(Token::Op(c.to_string()))
            }
            _ => match lx.operator() {
                Some(op) => Some(Token::Op(op)),
                None => {
                    return Err(LexError::UnexpectedChar {
                        ch: c,
                        line: lx.line,
                    });
                }
            },
        };

        if let (Some(token), Some(line)) = (token, current.as_mut()) {
            line.tokens.push(token);
        }
    }

    if let Some((open, line)) = brackets.pop() {
        return Err(LexError::UnclosedBracket { open, line });
    }
    out.lines.extend(current.take().filter(|l| !l.tokens.is_empty()));
    Ok(out)
}
