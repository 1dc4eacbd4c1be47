use proptest::prelude::*;
use sieve::{
    AggregateKind, EntityVocabulary, FunctionKind, InfixKind, Query, compile, dump, tokenize,
};

/// Words in value position: bare, or quoted with escapes, backslashes, symbols
/// and the other quote char inside
fn arb_word() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "[a-z][a-z\\\\'\"]{0,5}",
        r#""([a-z '=()$%/-]|\\[a-z'"\\ ]){1,6}""#,
        r#"'([a-z "=()$%/-]|\\[a-z'"\\ ]){1,6}'"#,
    ]
}

fn arb_leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_word(),
        ("[a-z]{1,4}", "[a-z]{1,4}", arb_word()).prop_map(|(c, p, v)| format!("/{c}/{p}={v}")),
        ("[a-z]{1,5}", arb_word()).prop_map(|(id, ty)| format!("%linkTo(id={id} type={ty})")),
    ]
}

fn arb_expr(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        return arb_leaf().boxed();
    }

    let infix = (
        arb_expr(depth - 1),
        prop_oneof![Just("and"), Just("or"), Just("exclude")],
        arb_expr(depth - 1),
    )
        .prop_map(|(lhs, op, rhs)| format!("({lhs} -{op} {rhs})"));
    let aggregate = (
        prop_oneof![Just("every"), Just("some")],
        prop::collection::vec(arb_expr(depth - 1), 0..3),
    )
        .prop_map(|(kind, children)| format!("${kind}({})", children.join(" ")));
    prop_oneof![arb_leaf(), infix, aggregate].boxed()
}

proptest! {
    #[test]
    fn dump_reaches_fixed_point(exprs in prop::collection::vec(arb_expr(3), 0..4)) {
        let source = exprs.join(" ");
        let first = compile(&source, &EntityVocabulary).expect("generated query should compile");
        let once = dump(&first, true);
        let second = compile(&once, &EntityVocabulary).expect("dump output should compile");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(dump(&second, true), once);
    }

    #[test]
    fn dump_of_any_full_text_is_stable(term in "[ -~]{0,12}") {
        let query: Query<AggregateKind, InfixKind, FunctionKind> = Query::full_text(term);
        let once = dump(&query, true);
        let reparsed = compile(&once, &EntityVocabulary).expect("dump output should compile");
        prop_assert_eq!(dump(&reparsed, true), once);
    }

    #[test]
    fn tokens_tile_any_printable_input(source in "[ -~\n\t]{0,40}") {
        let tokens = tokenize(&source).expect("printable ascii always tokenizes");
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        prop_assert_eq!(rebuilt, source.clone());
        if let Some(last) = tokens.last() {
            prop_assert_eq!(last.span.end.offset, source.len());
        }
    }
}
