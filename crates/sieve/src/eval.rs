//! Evaluator that walks a query tree against a resolver
//!
//! Children are resolved one after another in document order, then handed to
//! the resolver's combinators. The first resolver error aborts the walk.

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::query::Query;
use crate::resolver::{QueryOf, ResolveResult, Resolver};

/// Evaluate `query` into a weighted result set
pub async fn resolve<R: Resolver>(resolver: &R, query: &QueryOf<R>) -> ResolveResult<R::Id> {
    let hits = resolve_node(resolver, query).await?;
    log::debug!("query resolved to {} hits", hits.len());
    Ok(hits)
}

fn resolve_node<'a, R: Resolver>(
    resolver: &'a R,
    query: &'a QueryOf<R>,
) -> BoxFuture<'a, ResolveResult<R::Id>> {
    async move {
        match query {
            Query::FullText(term) => {
                log::trace!("full text {term:?}");
                resolver.full_text(term).await
            }
            Query::Property { path, value } => {
                log::trace!("property {path}={value:?}");
                resolver.property(path, value).await
            }
            Query::Function { name, params } => {
                log::trace!("function {name} with {} params", params.len());
                resolver.function(name, params).await
            }
            Query::Aggregate { kind, children } => match children.as_slice() {
                [] => Ok(Vec::new()),
                [only] => resolve_node(resolver, only).await,
                _ => {
                    let mut results = Vec::with_capacity(children.len());
                    for child in children {
                        results.push(resolve_node(resolver, child).await?);
                    }
                    log::trace!("aggregate {kind} over {} children", results.len());
                    resolver.aggregate(kind, results).await
                }
            },
            Query::Infix { kind, left, right } => {
                let left = resolve_node(resolver, left).await?;
                let right = resolve_node(resolver, right).await?;
                log::trace!("infix {kind}");
                resolver.infix(kind, left, right).await
            }
        }
    }
    .boxed()
}
