//! Caller-supplied vocabulary and evaluation backend
//!
//! `Vocabulary` decides which aggregate, infix and function names a query may
//! use. `Resolver` adds the callbacks the evaluator drives: leaf lookups and
//! the combinators that merge child results.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;
use thiserror::Error;

use crate::query::{Hit, Params, Query};

/// Bounds shared by every vocabulary name type
///
/// `Display` must print the name exactly as it is written in a query.
pub trait Name: Clone + Debug + PartialEq + Display + Send + Sync + 'static {}

impl<T> Name for T where T: Clone + Debug + PartialEq + Display + Send + Sync + 'static {}

pub trait Vocabulary {
    type Aggregate: Name;
    type Infix: Name;
    type Function: Name;

    /// Aggregate that wraps the top-level expressions of a query
    fn top_aggregate(&self) -> Self::Aggregate;

    fn validate_aggregate(&self, name: &str) -> Option<Self::Aggregate>;
    fn validate_infix(&self, name: &str) -> Option<Self::Infix>;
    fn validate_function(&self, name: &str) -> Option<Self::Function>;
}

/// Query tree typed by a vocabulary
pub type QueryOf<V> = Query<
    <V as Vocabulary>::Aggregate,
    <V as Vocabulary>::Infix,
    <V as Vocabulary>::Function,
>;

pub type ResolveResult<Id> = Result<Vec<Hit<Id>>, ResolveError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Invalid property path '{0}': expected /<collection>/<subpath>")]
    InvalidPath(String),

    #[error("Function '{function}' requires parameter '{param}'")]
    MissingParameter { function: String, param: String },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Resolver: Vocabulary + Send + Sync {
    type Id: Clone + Eq + Hash + Debug + Send + Sync;

    async fn full_text(&self, term: &str) -> ResolveResult<Self::Id>;

    async fn property(&self, path: &str, value: &str) -> ResolveResult<Self::Id>;

    async fn function(&self, name: &Self::Function, params: &Params) -> ResolveResult<Self::Id>;

    /// Merge the results of two or more aggregate children
    async fn aggregate(
        &self,
        kind: &Self::Aggregate,
        children: Vec<Vec<Hit<Self::Id>>>,
    ) -> ResolveResult<Self::Id>;

    async fn infix(
        &self,
        kind: &Self::Infix,
        left: Vec<Hit<Self::Id>>,
        right: Vec<Hit<Self::Id>>,
    ) -> ResolveResult<Self::Id>;
}
