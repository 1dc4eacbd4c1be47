//! Default resolver for entity stores
//!
//! Provides the standard vocabulary (`every`/`some` aggregates, `and`/`or`/
//! `exclude` infixes, the `linkTo` function) and binds it to a `Backend` that
//! answers tag, full-text and link lookups.

use std::fmt::{self, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::merge;
use crate::query::{Hit, Params};
use crate::resolver::{ResolveError, ResolveResult, Resolver, Vocabulary};

// ============ Vocabulary ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// Intersection of all children
    Every,
    /// Union of all children
    Some,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixKind {
    And,
    Or,
    /// Left results whose id is absent from the right
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `%linkTo(id=... type=...)`: entities linked to the given entity
    LinkTo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown name '{}'", self.0)
    }
}

impl std::error::Error for UnknownName {}

macro_rules! named_kind {
    ($kind:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $kind {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($kind::$variant => $name,)+
                }
            }
        }

        impl FromStr for $kind {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($kind::$variant),)+
                    _ => Err(UnknownName(s.to_string())),
                }
            }
        }

        impl Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_kind!(AggregateKind { Every => "every", Some => "some" });
named_kind!(InfixKind { And => "and", Or => "or", Exclude => "exclude" });
named_kind!(FunctionKind { LinkTo => "linkTo" });

/// The default vocabulary without a backend, for compiling and dumping
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityVocabulary;

impl Vocabulary for EntityVocabulary {
    type Aggregate = AggregateKind;
    type Infix = InfixKind;
    type Function = FunctionKind;

    fn top_aggregate(&self) -> AggregateKind {
        AggregateKind::Every
    }

    fn validate_aggregate(&self, name: &str) -> Option<AggregateKind> {
        name.parse().ok()
    }

    fn validate_infix(&self, name: &str) -> Option<InfixKind> {
        name.parse().ok()
    }

    fn validate_function(&self, name: &str) -> Option<FunctionKind> {
        name.parse().ok()
    }
}

// ============ Backend ============

/// Storage lookups the default resolver delegates to
#[async_trait]
pub trait Backend: Send + Sync {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync;

    /// Entities of `collection` whose tag at `path` equals `value`
    async fn tag_query(&self, collection: &str, path: &str, value: &str) -> ResolveResult<Self::Id>;

    /// Entities matching a full-text term, across all collections
    async fn full_text(&self, term: &str) -> ResolveResult<Self::Id>;

    /// Ids on the other side of every link touching `(collection, id)`
    async fn linked(&self, collection: &str, id: &str) -> Result<Vec<Self::Id>, ResolveError>;
}

// ============ Resolver ============

static PROPERTY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(/.+)$").expect("property path pattern is valid")
});

/// Split `/collection/sub/path` into `("collection", "/sub/path")`
pub fn split_property_path(path: &str) -> Option<(&str, &str)> {
    let caps = PROPERTY_PATH.captures(path)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Resolver implementing the default vocabulary over a `Backend`
pub struct EntityResolver<B> {
    backend: B,
}

impl<B: Backend> EntityResolver<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn link_to(&self, params: &Params) -> ResolveResult<B::Id> {
        let param = |name: &str| {
            params
                .get(name)
                .ok_or_else(|| ResolveError::MissingParameter {
                    function: FunctionKind::LinkTo.to_string(),
                    param: name.to_string(),
                })
        };
        let id = param("id")?;
        let collection = param("type")?;
        let ids = self.backend.linked(collection, id).await?;
        Ok(ids.into_iter().map(|id| Hit::new(id, 1.0)).collect())
    }
}

impl<B> Vocabulary for EntityResolver<B> {
    type Aggregate = AggregateKind;
    type Infix = InfixKind;
    type Function = FunctionKind;

    fn top_aggregate(&self) -> AggregateKind {
        EntityVocabulary.top_aggregate()
    }

    fn validate_aggregate(&self, name: &str) -> Option<AggregateKind> {
        EntityVocabulary.validate_aggregate(name)
    }

    fn validate_infix(&self, name: &str) -> Option<InfixKind> {
        EntityVocabulary.validate_infix(name)
    }

    fn validate_function(&self, name: &str) -> Option<FunctionKind> {
        EntityVocabulary.validate_function(name)
    }
}

#[async_trait]
impl<B: Backend> Resolver for EntityResolver<B> {
    type Id = B::Id;

    async fn full_text(&self, term: &str) -> ResolveResult<B::Id> {
        self.backend.full_text(term).await
    }

    async fn property(&self, path: &str, value: &str) -> ResolveResult<B::Id> {
        let (collection, subpath) =
            split_property_path(path).ok_or_else(|| ResolveError::InvalidPath(path.to_string()))?;
        self.backend.tag_query(collection, subpath, value).await
    }

    async fn function(&self, name: &FunctionKind, params: &Params) -> ResolveResult<B::Id> {
        match name {
            FunctionKind::LinkTo => self.link_to(params).await,
        }
    }

    async fn aggregate(
        &self,
        kind: &AggregateKind,
        children: Vec<Vec<Hit<B::Id>>>,
    ) -> ResolveResult<B::Id> {
        Ok(match kind {
            AggregateKind::Every => merge::intersection(&children),
            AggregateKind::Some => merge::union(&children),
        })
    }

    async fn infix(
        &self,
        kind: &InfixKind,
        left: Vec<Hit<B::Id>>,
        right: Vec<Hit<B::Id>>,
    ) -> ResolveResult<B::Id> {
        Ok(match kind {
            InfixKind::And => merge::intersection(&[left, right]),
            InfixKind::Or => merge::union(&[left, right]),
            InfixKind::Exclude => merge::exclude(left, &right),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::Mutex;

    /// Backend that answers every lookup with a fixed id and records its calls
    #[derive(Default)]
    struct Echo {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Backend for Echo {
        type Id = String;

        async fn tag_query(&self, collection: &str, path: &str, value: &str) -> ResolveResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("tag {collection} {path} {value}"));
            Ok(vec![Hit::new(value.to_string(), 1.0)])
        }

        async fn full_text(&self, term: &str) -> ResolveResult<String> {
            self.calls.lock().unwrap().push(format!("text {term}"));
            Ok(vec![Hit::new(term.to_string(), 0.5)])
        }

        async fn linked(&self, collection: &str, id: &str) -> Result<Vec<String>, ResolveError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("linked {collection} {id}"));
            Ok(vec![format!("{id}-1"), format!("{id}-2")])
        }
    }

    #[test]
    fn names_round_trip_through_display() {
        for name in ["every", "some"] {
            assert_eq!(name.parse::<AggregateKind>().unwrap().to_string(), name);
        }
        for name in ["and", "or", "exclude"] {
            assert_eq!(name.parse::<InfixKind>().unwrap().to_string(), name);
        }
        assert_eq!("linkTo".parse::<FunctionKind>().unwrap(), FunctionKind::LinkTo);
        assert!("linkto".parse::<FunctionKind>().is_err());
        assert!("AND".parse::<InfixKind>().is_err());
    }

    #[test]
    fn property_path_splits_collection() {
        assert_eq!(split_property_path("/note/title"), Some(("note", "/title")));
        assert_eq!(split_property_path("/note/a/b"), Some(("note", "/a/b")));
        assert_eq!(split_property_path("/note"), None);
        assert_eq!(split_property_path("/note/"), None);
        assert_eq!(split_property_path("note/title"), None);
    }

    #[test]
    fn property_delegates_to_tag_query() {
        let resolver = EntityResolver::new(Echo::default());
        let hits = block_on(resolver.property("/note/title", "x")).unwrap();
        assert_eq!(hits, vec![Hit::new("x".to_string(), 1.0)]);
        assert_eq!(
            *resolver.backend().calls.lock().unwrap(),
            vec!["tag note /title x"]
        );
    }

    #[test]
    fn malformed_property_path_is_an_error() {
        let resolver = EntityResolver::new(Echo::default());
        let err = block_on(resolver.property("/note", "x")).unwrap_err();
        assert_eq!(err, ResolveError::InvalidPath("/note".into()));
    }

    #[test]
    fn link_to_requires_id_and_type() {
        let resolver = EntityResolver::new(Echo::default());
        let mut params = Params::new();
        params.insert("id".into(), "n1".into());
        let err = block_on(resolver.function(&FunctionKind::LinkTo, &params)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingParameter {
                function: "linkTo".into(),
                param: "type".into()
            }
        );

        params.insert("type".into(), "note".into());
        let hits = block_on(resolver.function(&FunctionKind::LinkTo, &params)).unwrap();
        assert_eq!(
            hits,
            vec![
                Hit::new("n1-1".to_string(), 1.0),
                Hit::new("n1-2".to_string(), 1.0)
            ]
        );
        assert_eq!(
            *resolver.backend().calls.lock().unwrap(),
            vec!["linked note n1"]
        );
    }

    #[test]
    fn combinators_map_to_merges() {
        let resolver = EntityResolver::new(Echo::default());
        let left = vec![Hit::new("a".to_string(), 1.0), Hit::new("b".to_string(), 2.0)];
        let right = vec![Hit::new("b".to_string(), 1.0)];

        let and = block_on(resolver.infix(&InfixKind::And, left.clone(), right.clone())).unwrap();
        assert_eq!(and, vec![Hit::new("b".to_string(), 3.0)]);

        let or = block_on(resolver.infix(&InfixKind::Or, left.clone(), right.clone())).unwrap();
        assert_eq!(
            or,
            vec![Hit::new("a".to_string(), 1.0), Hit::new("b".to_string(), 3.0)]
        );

        let exclude = block_on(resolver.infix(&InfixKind::Exclude, left.clone(), right.clone())).unwrap();
        assert_eq!(exclude, vec![Hit::new("a".to_string(), 1.0)]);

        let some = block_on(resolver.aggregate(&AggregateKind::Some, vec![left, right])).unwrap();
        assert_eq!(some.len(), 2);
    }
}
