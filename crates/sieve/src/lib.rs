//! sieve - an embeddable query language for entity search
//!
//! A query string compiles to a typed tree that a pluggable resolver evaluates
//! into a weighted result set.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sieve::{EntityResolver, MemoryStore, rank, search};
//!
//! let store = MemoryStore::builder()
//!     .entity("note", "n1", "parser notes")
//!     .tag("/tag", "rust")
//!     .build();
//! let resolver = EntityResolver::new(store);
//!
//! let hits = search("parser -and /note/tag=rust", &resolver).await?;
//! for hit in rank(hits) {
//!     println!("{} {}", hit.id, hit.weight);
//! }
//! ```
//!
//! ## Syntax
//!
//! - `word`, `"quoted words"` → full-text term
//! - `/collection/path=value` → property equality
//! - `a -and b`, `a -or b`, `a -exclude b` → infix combinators (left-associative)
//! - `$every(a b)`, `$some(a b)` → aggregates over any number of expressions
//! - `%linkTo(id=n1 type=note)` → named function with arguments
//! - `( ... )` → grouping
//!
//! Top-level expressions are implicitly wrapped in the vocabulary's top
//! aggregate, so `a b` means `$every(a b)` with the default vocabulary.

pub mod ast;
mod dump;
mod entity;
mod eval;
mod merge;
mod parse;
mod position;
mod query;
mod resolver;
mod store;
mod tokenize;
mod transform;

use thiserror::Error;

// ============ Primary Public API ============

pub use dump::dump;
pub use entity::{
    AggregateKind, Backend, EntityResolver, EntityVocabulary, FunctionKind, InfixKind, UnknownName,
    split_property_path,
};
pub use eval::resolve;
pub use parse::parse;
pub use position::{Position, Span, SyntaxError, SyntaxErrorKind};
pub use query::{Hit, Params, Query, rank};
pub use resolver::{Name, QueryOf, ResolveError, ResolveResult, Resolver, Vocabulary};
pub use store::{Entity, EntityRef, Link, MemoryStore, StoreBuilder, StoreData, TagValue};
pub use tokenize::{Symbol, Token, TokenKind, tokenize};
pub use transform::{compile, transform};

/// Set-merge combinators used by the default resolver
pub mod combinators {
    pub use crate::merge::{exclude, intersection, union};
}

/// Compile and evaluate a query in one step
pub async fn search<R: Resolver>(source: &str, resolver: &R) -> Result<Vec<Hit<R::Id>>, SearchError> {
    let query = compile(source, resolver)?;
    let hits = resolve(resolver, &query).await?;
    Ok(hits)
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
}
