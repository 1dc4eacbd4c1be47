//! Parse tree for sieve queries
//!
//! Mirrors the grammar before any name validation. Every node remembers where
//! it started so later passes can report errors against the source.

use crate::position::Position;

/// A word in value position (bare or quoted), already unescaped
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub content: String,
    pub pos: Position,
}

/// A `/`-delimited property path
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub content: String,
    pub pos: Position,
}

/// `left -name right -name right ...`, folded left-to-right later
#[derive(Debug, Clone, PartialEq)]
pub struct Infix {
    pub left: Term,
    pub rest: Vec<InfixStep>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixStep {
    pub infix: Value,
    pub right: Term,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub content: TermContent,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TermContent {
    /// Bracketed sub-expression: `( infix )`
    Group(Box<Infix>),
    FullText(Value),
    Property(Property),
    Function(Function),
    Aggregate(Aggregate),
}

/// `path=value`
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub path: Path,
    pub value: Value,
}

/// `%name(arg=value ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Value,
    pub args: Vec<ArgItem>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgItem {
    pub name: Value,
    pub value: Value,
}

/// `$name(infix infix ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub name: Value,
    pub contents: Vec<Infix>,
    pub pos: Position,
}
