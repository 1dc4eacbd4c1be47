//! Source positions and syntax errors
//!
//! Positions are only used to point at the offending input in error messages;
//! nothing downstream of the parser depends on them.

use std::fmt;

/// A location in the source text
///
/// `row` and `col` are 1-based (`col` counts chars), `offset` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        row: 1,
        col: 1,
        offset: 0,
    };

    /// Position reached after consuming `text` from `self`
    pub fn advance(self, text: &str) -> Position {
        let mut pos = self;
        for ch in text.chars() {
            pos.offset += ch.len_utf8();
            if ch == '\n' {
                pos.row += 1;
                pos.col = 1;
            } else {
                pos.col += 1;
            }
        }
        pos
    }

    /// Compute the position of a byte offset in `source`
    pub fn locate(source: &str, offset: usize) -> Position {
        let mut bounded = offset.min(source.len());
        while !source.is_char_boundary(bounded) {
            bounded -= 1;
        }
        Position::START.advance(&source[..bounded])
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row, self.col)
    }
}

/// Half-open range of source covered by a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// No token can start at this character
    UnexpectedCharacter,
    /// A token the grammar does not allow here
    UnexpectedToken,
    /// Input ended while a production still needed tokens
    UnexpectedEnd,
    /// An aggregate, infix or function name the vocabulary rejected
    UnknownName,
}

/// Lexical, syntactic or name-validation error with source context
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub position: Option<Position>,
    /// The offending source line followed by a caret line
    pub context: Option<String>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            context: None,
        }
    }

    /// Error pointing at `position` inside `source`
    pub fn at(
        kind: SyntaxErrorKind,
        message: impl Into<String>,
        source: &str,
        position: Position,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            position: Some(position),
            context: Some(source_context(source, position)),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(pos) = self.position {
            write!(f, " ({pos})")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n{context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

fn source_context(source: &str, position: Position) -> String {
    let line = source.lines().nth(position.row.saturating_sub(1)).unwrap_or("");
    let pad = " ".repeat(position.col.saturating_sub(1));
    format!("{line}\n{pad}^")
}
