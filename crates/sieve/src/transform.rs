//! Transform the parse tree into a validated query
//!
//! This pass:
//! - Wraps the top-level expressions in the vocabulary's top aggregate
//! - Folds infix chains left-to-right
//! - Checks every aggregate, infix and function name against the vocabulary

use crate::ast::{self, TermContent};
use crate::parse::parse;
use crate::position::{SyntaxError, SyntaxErrorKind};
use crate::query::{Params, Query};
use crate::resolver::{QueryOf, Vocabulary};

/// Parse and validate a query in one step
pub fn compile<V: Vocabulary>(source: &str, vocab: &V) -> Result<QueryOf<V>, SyntaxError> {
    let list = parse(source)?;
    let query = transform(source, list, vocab)?;
    log::debug!("compiled query: {query}");
    Ok(query)
}

/// Convert parsed top-level expressions into a query rooted at the top aggregate
pub fn transform<V: Vocabulary>(
    source: &str,
    list: Vec<ast::Infix>,
    vocab: &V,
) -> Result<QueryOf<V>, SyntaxError> {
    let cx = Transform { source, vocab };
    let children = list
        .into_iter()
        .map(|infix| cx.infix(infix))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Query::Aggregate {
        kind: vocab.top_aggregate(),
        children,
    })
}

struct Transform<'a, V> {
    source: &'a str,
    vocab: &'a V,
}

impl<V: Vocabulary> Transform<'_, V> {
    fn infix(&self, infix: ast::Infix) -> Result<QueryOf<V>, SyntaxError> {
        let left = self.term(infix.left)?;
        infix.rest.into_iter().try_fold(left, |acc, step| {
            let kind = self.name(&step.infix, "infix", |v, n| v.validate_infix(n))?;
            let right = self.term(step.right)?;
            Ok(acc.infix(kind, right))
        })
    }

    fn term(&self, term: ast::Term) -> Result<QueryOf<V>, SyntaxError> {
        match term.content {
            TermContent::Group(inner) => self.infix(*inner),
            TermContent::FullText(value) => Ok(Query::FullText(value.content)),
            TermContent::Property(prop) => Ok(Query::Property {
                path: prop.path.content,
                value: prop.value.content,
            }),
            TermContent::Aggregate(aggregate) => {
                let kind = self.name(&aggregate.name, "aggregate", |v, n| v.validate_aggregate(n))?;
                let children = aggregate
                    .contents
                    .into_iter()
                    .map(|infix| self.infix(infix))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Query::Aggregate { kind, children })
            }
            TermContent::Function(function) => {
                let name = self.name(&function.name, "function", |v, n| v.validate_function(n))?;
                let mut params = Params::new();
                for arg in function.args {
                    params.insert(arg.name.content, arg.value.content);
                }
                Ok(Query::Function { name, params })
            }
        }
    }

    fn name<T>(
        &self,
        value: &ast::Value,
        what: &str,
        lookup: impl FnOnce(&V, &str) -> Option<T>,
    ) -> Result<T, SyntaxError> {
        lookup(self.vocab, &value.content).ok_or_else(|| {
            SyntaxError::at(
                SyntaxErrorKind::UnknownName,
                format!("Unknown {what} '{}'", value.content),
                self.source,
                value.pos,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AggregateKind, EntityVocabulary, FunctionKind, InfixKind};

    type Q = QueryOf<EntityVocabulary>;

    fn compile_ok(source: &str) -> Q {
        compile(source, &EntityVocabulary).unwrap()
    }

    #[test]
    fn empty_query_is_empty_top_aggregate() {
        assert_eq!(
            compile_ok(""),
            Query::Aggregate {
                kind: AggregateKind::Every,
                children: vec![]
            }
        );
    }

    #[test]
    fn top_level_siblings_wrap_in_top_aggregate() {
        let query = compile_ok("a b");
        assert_eq!(
            query,
            Query::Aggregate {
                kind: AggregateKind::Every,
                children: vec![Query::full_text("a"), Query::full_text("b")],
            }
        );
    }

    #[test]
    fn infix_folds_left() {
        let query = compile_ok("a -and b -or c");
        let expected = Query::full_text("a")
            .infix(InfixKind::And, Query::full_text("b"))
            .infix(InfixKind::Or, Query::full_text("c"));
        assert_eq!(
            query,
            Query::Aggregate {
                kind: AggregateKind::Every,
                children: vec![expected],
            }
        );
    }

    #[test]
    fn group_converts_to_inner_expression() {
        let grouped = compile_ok("a -and (b -or c)");
        let expected = Query::full_text("a").infix(
            InfixKind::And,
            Query::full_text("b").infix(InfixKind::Or, Query::full_text("c")),
        );
        assert_eq!(
            grouped,
            Query::Aggregate {
                kind: AggregateKind::Every,
                children: vec![expected],
            }
        );
        assert_eq!(compile_ok("((k))"), compile_ok("k"));
    }

    #[test]
    fn function_params_keep_last_duplicate() {
        let query = compile_ok("%linkTo(id=1 type=note id=2)");
        let Query::Aggregate { children, .. } = query else {
            panic!("expected top aggregate");
        };
        match &children[0] {
            Query::Function { name, params } => {
                assert_eq!(*name, FunctionKind::LinkTo);
                let pairs: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                assert_eq!(pairs, vec![("id", "2"), ("type", "note")]);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_are_positioned_errors() {
        let err = compile("a -xor b", &EntityVocabulary).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnknownName);
        assert!(err.message.contains("'xor'"));
        assert_eq!(err.position.unwrap().offset, 3);

        let err = compile("$most(a)", &EntityVocabulary).unwrap_err();
        assert!(err.message.contains("aggregate 'most'"));

        let err = compile("%linkFrom(id=1)", &EntityVocabulary).unwrap_err();
        assert!(err.message.contains("function 'linkFrom'"));
    }
}
