//! Render a query back into source text
//!
//! The output re-parses to the same tree, so dumping is a fixed point after one
//! normalization pass. The one lossy case is a quoted value ending in an odd run
//! of backslashes: one backslash is added so the closing quote stays unescaped. `Display for Query` renders a single node; `dump` can also
//! unwrap the implicit top-level aggregate.

use std::fmt::{self, Display, Write};

use crate::query::Query;
use crate::tokenize::is_symbol;

/// Dump `query` as source text
///
/// With `remove_top_aggregate`, an aggregate root is rendered as its space
/// separated children, which is what `compile` wraps back up.
pub fn dump<A, I, F>(query: &Query<A, I, F>, remove_top_aggregate: bool) -> String
where
    A: Display,
    I: Display,
    F: Display,
{
    match query {
        Query::Aggregate { children, .. } if remove_top_aggregate => children
            .iter()
            .map(|child| child.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        _ => query.to_string(),
    }
}

impl<A: Display, I: Display, F: Display> Display for Query<A, I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::FullText(term) => write_value(f, term),
            Query::Property { path, value } => {
                write!(f, "{path}=")?;
                write_value(f, value)
            }
            Query::Aggregate { kind, children } => {
                write!(f, "${kind}(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Query::Function { name, params } => {
                write!(f, "%{name}(")?;
                let mut first = true;
                for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
                    if !first {
                        write!(f, " ")?;
                    }
                    first = false;
                    write_value(f, key)?;
                    write!(f, "=")?;
                    write_value(f, value)?;
                }
                write!(f, ")")
            }
            Query::Infix { .. } => {
                write!(f, "(")?;
                write_chain(f, self)?;
                write!(f, ")")
            }
        }
    }
}

/// Write an infix chain without its own parentheses; a left operand that is
/// itself an infix continues the same chain
fn write_chain<A, I, F>(f: &mut fmt::Formatter<'_>, query: &Query<A, I, F>) -> fmt::Result
where
    A: Display,
    I: Display,
    F: Display,
{
    match query {
        Query::Infix { kind, left, right } => {
            write_chain(f, left)?;
            write!(f, " -{kind} {right}")
        }
        other => write!(f, "{other}"),
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if !needs_quotes(value) {
        return f.write_str(value);
    }
    let quote = if drops_backslash(value, '"') && !drops_backslash(value, '\'') {
        '\''
    } else {
        '"'
    };

    f.write_char(quote)?;
    let mut run = 0;
    for c in value.chars() {
        if c == '\\' {
            run += 1;
            continue;
        }
        // An escaped quote needs an even run in front of its own backslash
        if c == quote {
            write_backslashes(f, run + run % 2)?;
            f.write_char('\\')?;
        } else {
            write_backslashes(f, run)?;
        }
        f.write_char(c)?;
        run = 0;
    }
    // The closing quote must not be escaped
    write_backslashes(f, run + run % 2)?;
    f.write_char(quote)
}

fn write_backslashes(f: &mut fmt::Formatter<'_>, count: usize) -> fmt::Result {
    for _ in 0..count {
        f.write_char('\\')?;
    }
    Ok(())
}

/// Whether `value` has an odd run of backslashes right before `quote`, which
/// cannot be written inside `quote` delimiters without changing it
fn drops_backslash(value: &str, quote: char) -> bool {
    let mut run = 0;
    for c in value.chars() {
        if c == '\\' {
            run += 1;
            continue;
        }
        if c == quote && run % 2 == 1 {
            return true;
        }
        run = 0;
    }
    false
}

/// Whether a bare rendering would tokenize differently
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.starts_with(['"', '\'', '/'])
        || value.chars().any(|c| c.is_whitespace() || is_symbol(c))
}
