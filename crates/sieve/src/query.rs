//! Validated query tree and result types
//!
//! A `Query` only carries names the vocabulary accepted. Literal values (search
//! terms, property values, function arguments) stay plain strings.

use indexmap::IndexMap;

/// Function arguments in source order; a repeated name keeps its first slot
/// and takes the last value
pub type Params = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Query<A, I, F> {
    /// `path=value`
    Property { path: String, value: String },

    /// Bare or quoted search term
    FullText(String),

    /// `$kind(child child ...)`
    Aggregate { kind: A, children: Vec<Query<A, I, F>> },

    /// `left -kind right`
    Infix {
        kind: I,
        left: Box<Query<A, I, F>>,
        right: Box<Query<A, I, F>>,
    },

    /// `%name(key=value ...)`
    Function { name: F, params: Params },
}

impl<A, I, F> Query<A, I, F> {
    pub fn property(path: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Property {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn full_text(term: impl Into<String>) -> Self {
        Query::FullText(term.into())
    }

    pub fn infix(self, kind: I, right: Self) -> Self {
        Query::Infix {
            kind,
            left: Box::new(self),
            right: Box::new(right),
        }
    }
}

/// One weighted result id
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<Id> {
    pub id: Id,
    pub weight: f64,
}

impl<Id> Hit<Id> {
    pub fn new(id: Id, weight: f64) -> Self {
        Self { id, weight }
    }
}

/// Order hits by descending weight, keeping the incoming order for ties
pub fn rank<Id>(mut hits: Vec<Hit<Id>>) -> Vec<Hit<Id>> {
    hits.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_stable_for_ties() {
        let ranked = rank(vec![
            Hit::new("a", 1.0),
            Hit::new("b", 3.0),
            Hit::new("c", 1.0),
            Hit::new("d", 2.0),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }
}
